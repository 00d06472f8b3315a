/// x402 protocol version spoken by the guard and the hosted provider.
pub const X402_VERSION: u32 = 1;

/// x402 scheme name for exact-amount payments.
pub const SCHEME_NAME: &str = "exact";

/// Request header carrying the opaque payment proof.
pub const PAYMENT_HEADER: &str = "x-payment";

/// Response header carrying the base64-encoded settlement receipt.
pub const PAYMENT_RESPONSE_HEADER: &str = "X-PAYMENT-RESPONSE";

/// Response header carrying the base64-encoded challenge body.
pub const PAYMENT_REQUIRED_HEADER: &str = "PAYMENT-REQUIRED";

/// Header used to authenticate against the hosted settlement API.
pub const SECRET_KEY_HEADER: &str = "x-secret-key";

/// Default hosted settlement API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.thirdweb.com";

/// Default price of the protected resource.
pub const DEFAULT_PRICE: &str = "$0.01";

/// Seconds a signed payment stays valid for the provider.
pub const MAX_TIMEOUT_SECONDS: u64 = 300;

/// Bound on every call to the settlement provider.
pub const PROVIDER_TIMEOUT_SECS: u64 = 30;
