use flightsure_crypto::signatures::{address_of, generate_keypair, keypair_from_seed, sign, SigningKey};
use flightsure_types::instruction::LedgerInstruction;
use flightsure_types::{Address, Transaction};

/// Signing key plus the next nonce to use.
#[derive(Clone)]
pub struct Wallet {
    key: SigningKey,
    address: Address,
    nonce: u64,
}

impl Wallet {
    pub fn new(key: SigningKey) -> Self {
        let address = address_of(&key);
        Self { key, address, nonce: 0 }
    }

    pub fn generate() -> Self {
        Self::new(generate_keypair())
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::new(keypair_from_seed(seed))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Signs `instruction` with the next nonce and advances it.
    pub fn sign(&mut self, instruction: LedgerInstruction) -> Transaction {
        let mut tx = Transaction::new(self.address, self.nonce, instruction);
        tx.signature = sign(&self.key, &tx.signing_bytes());
        self.nonce += 1;
        tx
    }
}
