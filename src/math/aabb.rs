use super::vec3::Vec3;

/// Axis-aligned bounding box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Cube of half-extent `half` centered on `center`.
    pub fn cube(center: Vec3, half: f64) -> Self {
        Self::new(center - Vec3::splat(half), center + Vec3::splat(half))
    }

    /// Smallest box holding every point, or `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |acc, p| {
            Self::new(acc.min.min(p), acc.max.max(p))
        }))
    }

    /// True when `other` lies entirely inside `self` (boundaries included).
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.min.z <= other.min.z
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
            && self.max.z >= other.max.z
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn union(&self, other: &Aabb) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Grows the box by `amount` on every side.
    pub fn padded(&self, amount: f64) -> Self {
        Self::new(self.min - Vec3::splat(amount), self.max + Vec3::splat(amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_implies_corners_inside() {
        let outer = Aabb::new(Vec3::splat(-2.0), Vec3::splat(2.0));
        let boxes = [
            Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)),
            Aabb::new(Vec3::new(-2.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0)),
            Aabb::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 1.5, 1.5)),
            Aabb::new(Vec3::splat(-3.0), Vec3::splat(3.0)),
        ];
        for inner in boxes {
            if outer.contains(&inner) {
                assert!(outer.contains_point(inner.min));
                assert!(outer.contains_point(inner.max));
            }
        }
        assert!(outer.contains(&boxes[0]));
        assert!(outer.contains(&boxes[1]));
        assert!(!outer.contains(&boxes[2]));
        assert!(!outer.contains(&boxes[3]));
    }

    #[test]
    fn from_points_center_and_size() {
        let b = Aabb::from_points([
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(-1.0, 4.0, 1.0),
            Vec3::new(0.0, 2.0, 0.0),
        ])
        .unwrap();
        assert_eq!(b.center(), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(b.size(), Vec3::new(2.0, 4.0, 2.0));
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }
}
