// gpu/mod.rs — Compute acceleration layer.
//
// wgpu-based implementation of the batch point transform. The host
// implementation in `dispatch::HostTransform` stays the authoritative
// reference; the GPU kernel is validated against it point-for-point.
//
// Architecture: the host drives, the device only transforms.
//
//   host:    compose matrix → [GPU: transform N points] → rasterize
//
// The readback after every dispatch is mandatory: rasterization needs the
// transformed points on the host each frame.

pub mod device;
pub mod transform;
