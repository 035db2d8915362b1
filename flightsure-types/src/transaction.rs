use crate::instruction::LedgerInstruction;
use crate::Address;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    pub sender: Address,
    pub nonce: u64,
    pub instruction: LedgerInstruction,
    pub signature: Vec<u8>,
}

impl Transaction {
    pub fn new(sender: Address, nonce: u64, instruction: LedgerInstruction) -> Self {
        Self {
            sender,
            nonce,
            instruction,
            signature: Vec::new(),
        }
    }

    pub fn signing_bytes(&self) -> Vec<u8> {
        #[derive(Serialize)]
        struct SigningTx<'a> {
            sender: &'a Address,
            nonce: u64,
            instruction: &'a LedgerInstruction,
        }

        let signing = SigningTx {
            sender: &self.sender,
            nonce: self.nonce,
            instruction: &self.instruction,
        };

        bincode::serialize(&signing).expect("tx signing serialization")
    }

    pub fn id(&self) -> [u8; 32] {
        use blake3::Hasher;
        let mut hasher = Hasher::new();
        hasher.update(&self.signing_bytes());
        hasher.update(&self.signature);
        *hasher.finalize().as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_covers_signature() {
        let mut tx = Transaction::new([1u8; 32], 0, LedgerInstruction::Withdraw);
        let unsigned = tx.id();
        tx.signature = vec![7u8; 64];
        assert_ne!(unsigned, tx.id());
    }

    #[test]
    fn signing_bytes_exclude_signature() {
        let mut tx = Transaction::new([1u8; 32], 3, LedgerInstruction::FundAirline { amount: 10 });
        let before = tx.signing_bytes();
        tx.signature = vec![1u8; 64];
        assert_eq!(before, tx.signing_bytes());
    }
}
