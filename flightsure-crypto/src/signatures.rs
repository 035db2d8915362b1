pub use ed25519_dalek::{SigningKey, VerifyingKey};
use anyhow::{anyhow, bail, Result};
use ed25519_dalek::{Signature, Signer, Verifier};
use rand::rngs::OsRng;

pub fn generate_keypair() -> SigningKey {
    let mut csprng = OsRng;
    SigningKey::generate(&mut csprng)
}

/// Deterministic key for tests and simulations.
pub fn keypair_from_seed(seed: &[u8; 32]) -> SigningKey {
    SigningKey::from_bytes(seed)
}

pub fn address_of(key: &SigningKey) -> [u8; 32] {
    key.verifying_key().to_bytes()
}

pub fn sign(key: &SigningKey, message: &[u8]) -> Vec<u8> {
    let sig: Signature = key.sign(message);
    sig.to_bytes().to_vec()
}

pub fn verify_signature(pubkey_bytes: &[u8; 32], message: &[u8], signature_bytes: &[u8]) -> Result<()> {
    let pubkey = VerifyingKey::from_bytes(pubkey_bytes).map_err(|_| anyhow!("Invalid public key"))?;

    let bytes: &[u8; 64] = match signature_bytes.try_into() {
        Ok(b) => b,
        Err(_) => bail!("Invalid signature length"),
    };
    let signature = Signature::from_bytes(bytes);

    pubkey
        .verify(message, &signature)
        .map_err(|_| anyhow!("Signature verification failed"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let kp = generate_keypair();
        let sig = sign(&kp, b"fund");
        assert!(verify_signature(&address_of(&kp), b"fund", &sig).is_ok());
        assert!(verify_signature(&address_of(&kp), b"vote", &sig).is_err());
    }

    #[test]
    fn rejects_truncated_signature() {
        let kp = keypair_from_seed(&[9u8; 32]);
        let sig = sign(&kp, b"withdraw");
        assert!(verify_signature(&address_of(&kp), b"withdraw", &sig[..63]).is_err());
    }
}
