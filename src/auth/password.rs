/// Salted bcrypt hashing. Holds only the work factor, so it is `Copy` and can be
/// moved onto the blocking pool freely.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, bcrypt::BcryptError> {
        bcrypt::hash(plaintext, self.cost)
    }

    /// False for a wrong password and for a digest bcrypt can't parse.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        bcrypt::verify(plaintext, digest).unwrap_or(false)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

/// bcrypt's lowest accepted work factor, for tests.
#[cfg(test)]
pub(crate) const TEST_COST: u32 = 4;
