//! Guest/Admin visibility gate.
//!
//! The passcode is a shared constant, so this only decides which controls a
//! browser sees. The data service's own access rules decide whether a write
//! goes through.

pub const DEFAULT_PASSCODE: &str = "hitcam";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminGate {
    #[default]
    Guest,
    Admin,
}

impl AdminGate {
    pub fn from_flag(is_admin: bool) -> Self {
        if is_admin { AdminGate::Admin } else { AdminGate::Guest }
    }

    pub fn is_admin(self) -> bool {
        self == AdminGate::Admin
    }

    /// Returns whether the passcode matched; a mismatch leaves the state as is.
    pub fn login(&mut self, passcode: &str, expected: &str) -> bool {
        if passcode == expected {
            *self = AdminGate::Admin;
            true
        } else {
            false
        }
    }

    pub fn logout(&mut self) {
        *self = AdminGate::Guest;
    }

    pub fn label(self) -> &'static str {
        match self {
            AdminGate::Guest => "Guest",
            AdminGate::Admin => "Admin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_passcode_promotes_guest() {
        let mut gate = AdminGate::Guest;
        assert!(gate.login(DEFAULT_PASSCODE, DEFAULT_PASSCODE));
        assert!(gate.is_admin());

        gate.logout();
        assert_eq!(gate, AdminGate::Guest);
    }

    #[test]
    fn wrong_passcode_keeps_guest() {
        let mut gate = AdminGate::Guest;
        assert!(!gate.login("letmein", DEFAULT_PASSCODE));
        assert_eq!(gate, AdminGate::Guest);
    }
}
