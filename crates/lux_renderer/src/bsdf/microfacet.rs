//! Isotropic GGX (Trowbridge-Reitz) microfacet distribution.
//!
//! All directions live in the local shading frame.

use std::f32::consts::PI;

use lux_math::{Vec2, Vec3};

/// Minimum alpha; perfectly smooth conductors are approximated by this.
pub const MIN_ALPHA: f32 = 1e-3;

/// Map perceptual roughness to GGX alpha.
#[inline]
pub fn roughness_to_alpha(roughness: f32) -> f32 {
    (roughness * roughness).max(MIN_ALPHA)
}

/// Normal distribution `D(wh)`.
pub fn evaluate_ggx(alpha: f32, wh: Vec3) -> f32 {
    if wh.z <= 0.0 {
        return 0.0;
    }
    let a2 = alpha * alpha;
    let cos2 = wh.z * wh.z;
    let d = 1.0 + (a2 - 1.0) * cos2;
    a2 / (PI * d * d)
}

/// Smith masking term for direction `w` seen through microfacet normal `wh`.
pub fn smith_g1(alpha: f32, wh: Vec3, w: Vec3) -> f32 {
    // Backfacing microfacets are never visible
    if w.dot(wh) * w.z <= 0.0 {
        return 0.0;
    }
    let cos2 = w.z * w.z;
    if cos2 >= 1.0 {
        return 1.0;
    }
    let tan2 = (1.0 - cos2) / cos2;
    2.0 / (1.0 + (1.0 + alpha * alpha * tan2).sqrt())
}

/// Sample a microfacet normal from the distribution of normals visible
/// from `wo` (Heitz 2018, "Sampling the GGX Distribution of Visible Normals").
///
/// `wo` must lie in the upper hemisphere.
pub fn sample_ggx_vndf(alpha: f32, wo: Vec3, u: Vec2) -> Vec3 {
    // Stretch the view vector to the hemisphere configuration
    let vh = Vec3::new(alpha * wo.x, alpha * wo.y, wo.z).normalize();

    // Orthonormal basis around vh
    let lensq = vh.x * vh.x + vh.y * vh.y;
    let t1 = if lensq > 0.0 {
        Vec3::new(-vh.y, vh.x, 0.0) / lensq.sqrt()
    } else {
        Vec3::X
    };
    let t2 = vh.cross(t1);

    // Uniform disk sample, warped towards the visible half
    let r = u.x.sqrt();
    let phi = 2.0 * PI * u.y;
    let p1 = r * phi.cos();
    let p2 = r * phi.sin();
    let s = 0.5 * (1.0 + vh.z);
    let p2 = (1.0 - s) * (1.0 - p1 * p1).max(0.0).sqrt() + s * p2;

    // Reproject onto the hemisphere and unstretch
    let nh = t1 * p1 + t2 * p2 + vh * (1.0 - p1 * p1 - p2 * p2).max(0.0).sqrt();
    Vec3::new(alpha * nh.x, alpha * nh.y, nh.z.max(0.0)).normalize()
}

/// Density of [`sample_ggx_vndf`] over microfacet normals.
pub fn pdf_ggx_vndf(alpha: f32, wh: Vec3, wo: Vec3) -> f32 {
    if wo.z == 0.0 {
        return 0.0;
    }
    evaluate_ggx(alpha, wh) * smith_g1(alpha, wh, wo) * wo.dot(wh).abs() / wo.z.abs()
}

/// Jacobian from half-vector density to reflected-direction density.
#[inline]
pub fn det_reflection(wh: Vec3, wo: Vec3) -> f32 {
    1.0 / (4.0 * wo.dot(wh).abs())
}
