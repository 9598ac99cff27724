//! okvs-store: Oblivious key-value stores
//!
//! Facade over the workspace crates:
//! - [`primitives`]: keyed PRF, GF(2^l) arithmetic, binary linear solver,
//!   polynomial interpolation
//! - everything else: the OKVS encoders, factory, config and wire format
//!
//! ```no_run
//! use std::collections::HashMap;
//! use okvs_store::{create_okvs, Okvs, OkvsType};
//! use rand::SeedableRng;
//!
//! let mut rng = rand_chacha::ChaCha20Rng::seed_from_u64(7);
//! let keys = okvs_store::primitives::prf::random_hash_keys(&mut rng, 4);
//! let okvs = create_okvs(OkvsType::H3TwoCoreGct, 1000, 128, &keys)?;
//!
//! let map = HashMap::from([("alice", vec![0xAA; 16]), ("bob", vec![0xBB; 16])]);
//! let storage = okvs.encode(&map, &mut rng)?;
//! assert_eq!(okvs.decode(&storage, "alice"), vec![0xAA; 16]);
//! # Ok::<(), okvs_store::OkvsError>(())
//! ```

pub use okvs::*;
pub use okvs_core as primitives;
