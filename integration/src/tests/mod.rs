//! Integration tests against a devnet

mod nft;
