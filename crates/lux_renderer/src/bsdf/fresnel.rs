//! Fresnel reflectance terms.

/// Schlick's approximation with normal-incidence reflectance `f0`.
#[inline]
pub fn schlick(f0: f32, cos_theta: f32) -> f32 {
    let m = (1.0 - cos_theta.clamp(0.0, 1.0)).powi(5);
    f0 + (1.0 - f0) * m
}

/// Reflectance of unpolarized light at a smooth dielectric interface.
///
/// `cos_theta_i` is the cosine on the incident side and `eta` the ratio of
/// the transmitted-side index to the incident-side index. Returns 1 under
/// total internal reflection.
pub fn fresnel_dielectric(cos_theta_i: f32, eta: f32) -> f32 {
    let cos_i = cos_theta_i.abs().min(1.0);
    let sin2_t = (1.0 - cos_i * cos_i) / (eta * eta);
    if sin2_t >= 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin2_t).sqrt();

    let rs = (cos_i - eta * cos_t) / (cos_i + eta * cos_t);
    let rp = (eta * cos_i - cos_t) / (eta * cos_i + cos_t);
    0.5 * (rs * rs + rp * rp)
}
