/// Failure kinds surfaced by every fallible constructor and message.
///
/// Any `Err` returned from a message reverts the whole call, so none of these
/// leave partially applied state behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub enum Error {
    /// Admin-only message called by someone other than the admin.
    Unauthorized,
    /// Minting while the sale is switched off.
    SaleInactive,
    /// Mint quantity of zero.
    InvalidQuantity,
    /// The mint would push the collection past its fixed cap.
    SupplyExceeded,
    /// Attached value differs from `price × quantity`.
    InsufficientPayment,
    /// Caller (or `from`) neither owns nor is approved for the token.
    NotOwner,
    /// Recipient is the zero account, or the approval targets the owner.
    InvalidRecipient,
    /// The token id has never been minted.
    TokenNotFound,
    /// Reflection share above 100 percent at construction.
    InvalidReflectionShare,
    /// A native value transfer out of the contract failed.
    TransferFailed,
    /// Arithmetic overflow or underflow in payment or reward accounting.
    Overflow,
}
