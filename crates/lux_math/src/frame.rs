use crate::Vec3;

/// Orthonormal shading frame. Local coordinates put the normal on +z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub tangent: Vec3,
    pub bitangent: Vec3,
    pub normal: Vec3,
}

impl Frame {
    /// Build a frame around a unit normal (Duff et al. 2017 branchless basis).
    pub fn from_normal(normal: Vec3) -> Self {
        let n = normal;
        let sign = 1.0_f32.copysign(n.z);
        let a = -1.0 / (sign + n.z);
        let b = n.x * n.y * a;

        let tangent = Vec3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
        let bitangent = Vec3::new(b, sign + n.y * n.y * a, -n.y);

        Self {
            tangent,
            bitangent,
            normal: n,
        }
    }

    /// Build a frame from a normal and a preferred tangent direction.
    ///
    /// The tangent is Gram-Schmidt projected onto the plane of the normal;
    /// if it is (nearly) parallel to the normal the branchless basis is used.
    pub fn from_normal_tangent(normal: Vec3, tangent: Vec3) -> Self {
        let t = tangent - normal * normal.dot(tangent);
        let len = t.length();
        if len < 1e-6 || !len.is_finite() {
            return Self::from_normal(normal);
        }
        let tangent = t / len;
        Self {
            tangent,
            bitangent: normal.cross(tangent),
            normal,
        }
    }

    /// Rebuild an orthonormal frame from a (possibly skewed) tangent basis.
    ///
    /// The normal is `tangent × bitangent`, the tangent keeps its direction
    /// and the bitangent is recomputed as `normal × tangent`.
    pub fn from_tangent_basis(tangent: Vec3, bitangent: Vec3) -> Option<Self> {
        let normal = tangent.cross(bitangent).try_normalize()?;
        let tangent = tangent.try_normalize()?;
        Some(Self {
            tangent,
            bitangent: normal.cross(tangent),
            normal,
        })
    }

    /// Negate the normal while keeping the frame right-handed.
    pub fn flipped(&self) -> Self {
        Self {
            tangent: self.tangent,
            bitangent: -self.bitangent,
            normal: -self.normal,
        }
    }

    /// World vector into local coordinates.
    #[inline]
    pub fn to_local(&self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.tangent), v.dot(self.bitangent), v.dot(self.normal))
    }

    /// Local vector into world coordinates.
    #[inline]
    pub fn to_world(&self, v: Vec3) -> Vec3 {
        self.tangent * v.x + self.bitangent * v.y + self.normal * v.z
    }

    /// True if all axes have unit length and are mutually perpendicular.
    pub fn is_orthonormal(&self, tolerance: f32) -> bool {
        (self.tangent.length() - 1.0).abs() < tolerance
            && (self.bitangent.length() - 1.0).abs() < tolerance
            && (self.normal.length() - 1.0).abs() < tolerance
            && self.tangent.dot(self.bitangent).abs() < tolerance
            && self.tangent.dot(self.normal).abs() < tolerance
            && self.bitangent.dot(self.normal).abs() < tolerance
    }

    #[inline]
    pub fn cos_theta(w: Vec3) -> f32 {
        w.z
    }

    #[inline]
    pub fn abs_cos_theta(w: Vec3) -> f32 {
        w.z.abs()
    }

    #[inline]
    pub fn same_hemisphere(a: Vec3, b: Vec3) -> bool {
        a.z * b.z > 0.0
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            tangent: Vec3::X,
            bitangent: Vec3::Y,
            normal: Vec3::Z,
        }
    }
}
