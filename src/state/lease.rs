//! Rule edit lease.
//!
//! An advisory, self-expiring claim on a group's rule set. No heartbeat: a
//! lease is compared against `now` on every access and simply lapses.

use crate::error::LockError;
use crate::platform::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditLease {
    pub owner: UserId,
    /// Unix seconds after which the lease no longer binds anyone.
    pub expires_at: i64,
}

impl EditLease {
    pub fn is_active(&self, now: i64) -> bool {
        now < self.expires_at
    }

    /// Whether `admin` is kept out by this lease at `now`.
    pub fn excludes(&self, admin: UserId, now: i64) -> bool {
        self.is_active(now) && self.owner != admin
    }
}

/// Claim or extend the lease for `admin`.
pub fn claim(
    lease: &mut Option<EditLease>,
    admin: UserId,
    now: i64,
    ttl: i64,
) -> Result<EditLease, LockError> {
    if let Some(current) = lease
        && current.excludes(admin, now)
    {
        return Err(LockError::AlreadyLocked {
            owner: current.owner,
            until: current.expires_at,
        });
    }

    let claimed = EditLease {
        owner: admin,
        expires_at: now.saturating_add(ttl),
    };
    *lease = Some(claimed);
    Ok(claimed)
}

/// Drop the lease if `admin` holds it. Returns whether anything was released.
pub fn release(lease: &mut Option<EditLease>, admin: UserId) -> bool {
    match lease {
        Some(current) if current.owner == admin => {
            *lease = None;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_admin_is_locked_out_until_expiry() {
        let mut lease = None;
        claim(&mut lease, 1, 1000, 600).unwrap();

        let err = claim(&mut lease, 2, 1599, 600).unwrap_err();
        assert_eq!(
            err,
            LockError::AlreadyLocked {
                owner: 1,
                until: 1600
            }
        );

        let taken = claim(&mut lease, 2, 1600, 600).unwrap();
        assert_eq!(taken.owner, 2);
    }

    #[test]
    fn owner_extends_own_lease() {
        let mut lease = None;
        claim(&mut lease, 1, 0, 600).unwrap();
        let extended = claim(&mut lease, 1, 500, 600).unwrap();
        assert_eq!(extended.expires_at, 1100);
    }

    #[test]
    fn only_owner_releases() {
        let mut lease = None;
        claim(&mut lease, 1, 0, 600).unwrap();
        assert!(!release(&mut lease, 2));
        assert!(release(&mut lease, 1));
        assert!(lease.is_none());
    }
}
