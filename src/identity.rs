//! Pseudonymous identity derivation.
//!
//! Users never register: each installation gets an opaque device
//! identifier, and the public-facing name is derived from it
//! deterministically. The same identifier always produces the same
//! adjective-noun pseudonym, on any platform and across restarts, so the
//! ranking service can key records by the name alone.

use chrono::Utc;
use log::{info, warn};
use rand::Rng;

use crate::app_response::AppResponse;
use crate::local_store::LocalStore;

pub const DEVICE_ID_KEY: &str = "@device_identifier";

pub const ADJECTIVES: [&str; 40] = [
    "Swift", "Bright", "Cool", "Clever", "Bold", "Quick", "Smart", "Brave",
    "Happy", "Lucky", "Mighty", "Noble", "Wild", "Wise", "Calm", "Fierce",
    "Gentle", "Jolly", "Keen", "Lively", "Merry", "Proud", "Radiant", "Silent",
    "Steady", "Speedy", "Vibrant", "Warm", "Zealous", "Agile", "Daring", "Epic",
    "Fleet", "Grand", "Hardy", "Intrepid", "Jovial", "Kinetic", "Luminous", "Mystic",
];

pub const NOUNS: [&str; 40] = [
    "Panda", "Tiger", "Eagle", "Falcon", "Dolphin", "Phoenix", "Dragon", "Wolf",
    "Bear", "Hawk", "Lion", "Raven", "Shark", "Cobra", "Fox", "Owl",
    "Jaguar", "Lynx", "Otter", "Panther", "Raccoon", "Seal", "Turtle", "Viper",
    "Whale", "Zebra", "Bison", "Crane", "Deer", "Elk", "Gazelle", "Heron",
    "Ibis", "Koala", "Lemur", "Moose", "Newt", "Orca", "Puma", "Rhino",
];

/// Derives a stable pseudonym from a seed string.
///
/// Pure and total: any seed, including the empty string, yields a valid
/// `"Adjective Noun"` pair, and equal seeds always yield equal names.
/// The hash is a 31-multiplier rolling hash over UTF-16 code units in
/// wrapping 32-bit arithmetic, with the noun index taken from the
/// floored quotient, so names agree with shells that hash JS strings the
/// same way.
pub fn derive_name(seed: &str) -> String {
    let mut hash: i32 = 0;
    for unit in seed.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(unit as i32);
    }

    let a = ADJECTIVES.len() as i64;
    let n = NOUNS.len() as i64;
    let adjective_index = ((hash as i64) % a).unsigned_abs() as usize;
    let noun_index = (((hash as f64) / a as f64).floor() as i64 % n).unsigned_abs() as usize;

    format!("{} {}", ADJECTIVES[adjective_index], NOUNS[noun_index])
}

/// Uniformly random adjective-noun pair. Only used to synthesize
/// placeholder leaderboard entries, never for a real identity.
pub fn random_name() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.gen_range(0..NOUNS.len())];
    format!("{} {}", adjective, noun)
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub(crate) fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

fn generate_device_id() -> String {
    format!("{}-{}", Utc::now().timestamp_millis(), random_suffix(9))
}

/// The installation's identity, resolved once at startup and handed to
/// the components that need it. The raw device identifier is only ever
/// used as a seed; the derived display name is what leaves the device.
#[derive(Debug, Clone)]
pub struct IdentityProvider {
    device_id: String,
    display_name: String,
}

impl IdentityProvider {
    /// Loads the persisted device identifier, creating and persisting a
    /// fresh one on first launch. Storage failures degrade to an
    /// ephemeral identifier rather than failing startup.
    pub fn load_or_create(store: &LocalStore) -> Self {
        let device_id = match store.get(DEVICE_ID_KEY) {
            Ok(Some(id)) if !id.is_empty() => id,
            Ok(_) => {
                let id = generate_device_id();
                if let Err(e) = store.put(DEVICE_ID_KEY, &id) {
                    warn!("Could not persist device identifier: {}", e);
                } else {
                    info!("Generated new device identifier");
                }
                id
            }
            Err(e) => {
                warn!("Could not read device identifier, using ephemeral one: {}", e);
                generate_device_id()
            }
        };

        let display_name = derive_name(&device_id);
        Self {
            device_id,
            display_name,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Removes the persisted identifier. The next launch mints a new
    /// identity; the current provider keeps serving the old one.
    pub fn clear(store: &LocalStore) -> Result<(), AppResponse> {
        store.remove(DEVICE_ID_KEY)?;
        info!("Device identifier cleared");
        Ok(())
    }
}
