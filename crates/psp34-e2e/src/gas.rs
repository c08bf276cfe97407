//! Fixed message weights charged by the development node

use psp34_primitives::Weight;

/// Constructor weight
pub const INSTANTIATE: Weight = 500_000;

/// Read-only messages
pub const QUERY: Weight = 5_000;

/// Owner-only setters
pub const SETTER: Weight = 40_000;

/// `approve`
pub const APPROVE: Weight = 60_000;

/// `transfer`
pub const TRANSFER: Weight = 90_000;

/// `mintNext`
pub const MINT_NEXT: Weight = 120_000;

/// `mint`, independent of the token count
pub const MINT: Weight = 150_000;

/// Weight charged for `message`
pub fn weight_of(message: &str) -> Weight {
    match message {
        "mintNext" => MINT_NEXT,
        "mint" => MINT,
        "transfer" => TRANSFER,
        "approve" => APPROVE,
        "setBaseUri" | "setMaxMintAmount" | "setMintEnd" | "setMintingStatus" => SETTER,
        _ => QUERY,
    }
}
