use glam::{Quat, Vec3, Vec4};

/// A value that keyframe tracks can blend between.
pub trait Interpolatable: Copy + Sized {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self;

    /// Cubic Hermite interpolation. Tangents are scaled by the keyframe span `dt`.
    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self;
}

/// Hermite basis weights `[value0, tangent0, value1, tangent1]` at `t`.
#[inline]
fn hermite_basis(t: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    [1.0 - h01, h11 - t2 + t, h01, h11]
}

impl Interpolatable for f32 {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start + (end - start) * t
    }

    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self {
        let [a, b, c, d] = hermite_basis(t);
        a * v0 + b * out_tangent0 * dt + c * v1 + d * in_tangent1 * dt
    }
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start.lerp(*end, t)
    }

    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self {
        let [a, b, c, d] = hermite_basis(t);
        *v0 * a + *out_tangent0 * (b * dt) + *v1 * c + *in_tangent1 * (d * dt)
    }
}

impl Interpolatable for Quat {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start.slerp(*end, t)
    }

    // Spline in 4D, then renormalize.
    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self {
        let [a, b, c, d] = hermite_basis(t);
        let blended = Vec4::from(*v0) * a
            + Vec4::from(*out_tangent0) * (b * dt)
            + Vec4::from(*v1) * c
            + Vec4::from(*in_tangent1) * (d * dt);
        Quat::from_vec4(blended).normalize()
    }
}
