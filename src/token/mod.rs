pub mod codec;
pub mod transport;

pub use codec::{TokenCodec, TokenError, Verified};
pub use transport::{get_token, parse_bearer, recombine, split, SplitToken, TokenTransport};
