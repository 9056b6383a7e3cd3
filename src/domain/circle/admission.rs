//! Admission policy - the capacity check gating new membership creation.

use super::Circle;

/// Returns whether `circle` can admit one more active member given the
/// current active member count.
///
/// Unlimited circles always admit. Limited circles admit only while the
/// active count is strictly below the cap.
///
/// Pure given the count; callers must evaluate it against a count read
/// inside the same transaction as the membership insert, otherwise two
/// concurrent admissions can overshoot the limit.
pub fn can_admit(circle: &Circle, active_count: u32) -> bool {
    match circle.member_cap() {
        Some(limit) => active_count < limit,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::circle::Slug;
    use crate::domain::foundation::CircleId;

    fn limited(limit: u32) -> Circle {
        Circle {
            id: CircleId::new(),
            slug: Slug::new("limited").unwrap(),
            is_limited: true,
            members_limit: limit,
        }
    }

    fn unlimited() -> Circle {
        Circle {
            id: CircleId::new(),
            slug: Slug::new("unlimited").unwrap(),
            is_limited: false,
            members_limit: 0,
        }
    }

    #[test]
    fn unlimited_circle_always_admits() {
        let circle = unlimited();
        assert!(can_admit(&circle, 0));
        assert!(can_admit(&circle, 10_000));
    }

    #[test]
    fn limited_circle_admits_below_cap() {
        let circle = limited(3);
        assert!(can_admit(&circle, 0));
        assert!(can_admit(&circle, 2));
    }

    #[test]
    fn limited_circle_refuses_at_cap() {
        let circle = limited(3);
        assert!(!can_admit(&circle, 3));
        assert!(!can_admit(&circle, 4));
    }

    #[test]
    fn zero_cap_circle_admits_nobody() {
        let circle = limited(0);
        assert!(!can_admit(&circle, 0));
    }
}
