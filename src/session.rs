//! Tenant context passed into every data-access call.

use uuid::Uuid;

/// Identity used until real authentication exists.
pub const DEMO_USER_ID: Uuid = Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440000);

/// The user on whose behalf a call reads and writes rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    user_id: Uuid,
}

impl Session {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }

    pub fn demo() -> Self {
        Self::new(DEMO_USER_ID)
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_user_matches_seed_data() {
        assert_eq!(
            Session::demo().user_id().to_string(),
            "550e8400-e29b-41d4-a716-446655440000"
        );
    }
}
