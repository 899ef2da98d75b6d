use anchor_lang::error::Error;
use anchor_lang::prelude::*;
use price_feeds::FeedError;

#[error_code]
pub enum MarketError {
    // Authorization
    #[msg("Signer is not the config authority")]
    InvalidAuthority,
    #[msg("Authority has already been set")]
    AuthorityAlreadySet,
    #[msg("Authority has not been set")]
    AuthorityNotSet,
    #[msg("Signer is neither the position owner nor its delegate")]
    UnauthorizedDelegate,
    #[msg("Invalid fee recipient")]
    InvalidRecipient,

    // Validation
    #[msg("Quote and collateral mints must differ")]
    SameTokenMints,
    #[msg("LTV factor must be strictly between 0 and 1")]
    InvalidLtvFactor,
    #[msg("A market with these parameters already exists")]
    MarketAlreadyExists,
    #[msg("Market not found")]
    MarketNotFound,
    #[msg("Position not found")]
    PositionNotFound,
    #[msg("Exactly one of assets or shares must be non-zero")]
    AssetShareValueMismatch,
    #[msg("Amount must be non-zero")]
    ZeroAmount,
    #[msg("Collateral is not active")]
    CollateralNotActive,
    #[msg("Collateral cannot be reactivated once inactive")]
    CollateralReactivation,
    #[msg("Fee factor exceeds the maximum")]
    FeeExceedsMax,
    #[msg("Fee factor is already set to this value")]
    FeeAlreadySet,
    #[msg("Borrow would exceed the market debt cap")]
    DebtCapExceeded,
    #[msg("Not enough liquidity in the market")]
    InsufficientLiquidity,
    #[msg("Seized amount exceeds the position collateral")]
    InsufficientCollateral,
    #[msg("Repaid shares exceed the position debt")]
    RepayExceedsDebt,
    #[msg("Oracle confidence is not below the price")]
    InvalidPriceConfidence,
    #[msg("Timestamp is earlier than the last accrual")]
    InvalidTimestamp,

    // Solvency
    #[msg("Borrower is not solvent")]
    NotSolvent,
    #[msg("Borrower is solvent and cannot be liquidated")]
    BorrowerIsSolvent,

    // Arithmetic
    #[msg("Math overflow")]
    MathOverflow,
    #[msg("Math underflow")]
    MathUnderflow,
    #[msg("Division by zero")]
    DivisionByZero,

    // Oracle
    #[msg("Oracle price is stale")]
    StaleOracle,
    #[msg("Oracle price must be positive")]
    InvalidOraclePrice,

    // Balances
    #[msg("Token balance too low")]
    InsufficientBalance,
    #[msg("Not enough shares in the position")]
    InsufficientShares,
}

/// Coarse failure classes callers branch on.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    #[error("caller is not allowed to perform this action")]
    Authorization,
    #[error("request rejected by market rules")]
    Validation,
    #[error("position solvency requirement not met")]
    Solvency,
    #[error("arithmetic failure")]
    Arithmetic,
    #[error("oracle price unusable")]
    Oracle,
    #[error("balance too low")]
    InsufficientBalance,
}

impl MarketError {
    pub fn kind(&self) -> ErrorKind {
        use MarketError::*;
        match self {
            InvalidAuthority | AuthorityAlreadySet | AuthorityNotSet | UnauthorizedDelegate
            | InvalidRecipient => ErrorKind::Authorization,
            SameTokenMints | InvalidLtvFactor | MarketAlreadyExists | MarketNotFound
            | PositionNotFound | AssetShareValueMismatch | ZeroAmount | CollateralNotActive
            | CollateralReactivation | FeeExceedsMax | FeeAlreadySet | DebtCapExceeded
            | InsufficientLiquidity | InsufficientCollateral | RepayExceedsDebt
            | InvalidPriceConfidence | InvalidTimestamp => ErrorKind::Validation,
            NotSolvent | BorrowerIsSolvent => ErrorKind::Solvency,
            MathOverflow | MathUnderflow | DivisionByZero => ErrorKind::Arithmetic,
            StaleOracle | InvalidOraclePrice => ErrorKind::Oracle,
            InsufficientBalance | InsufficientShares => ErrorKind::InsufficientBalance,
        }
    }

    /// Every variant in declaration order, so that `all()[i]` carries code
    /// `ERROR_CODE_OFFSET + i`.
    fn all() -> [MarketError; 31] {
        use MarketError::*;
        [
            InvalidAuthority,
            AuthorityAlreadySet,
            AuthorityNotSet,
            UnauthorizedDelegate,
            InvalidRecipient,
            SameTokenMints,
            InvalidLtvFactor,
            MarketAlreadyExists,
            MarketNotFound,
            PositionNotFound,
            AssetShareValueMismatch,
            ZeroAmount,
            CollateralNotActive,
            CollateralReactivation,
            FeeExceedsMax,
            FeeAlreadySet,
            DebtCapExceeded,
            InsufficientLiquidity,
            InsufficientCollateral,
            RepayExceedsDebt,
            InvalidPriceConfidence,
            InvalidTimestamp,
            NotSolvent,
            BorrowerIsSolvent,
            MathOverflow,
            MathUnderflow,
            DivisionByZero,
            StaleOracle,
            InvalidOraclePrice,
            InsufficientBalance,
            InsufficientShares,
        ]
    }
}

fn feed_error_kind(error: &FeedError) -> ErrorKind {
    match error {
        FeedError::Unauthorized => ErrorKind::Authorization,
        _ => ErrorKind::Oracle,
    }
}

fn feed_errors() -> [FeedError; 10] {
    use FeedError::*;
    [
        FeedNotFound,
        FeedAlreadyExists,
        Unauthorized,
        InvalidPrice,
        InvalidExponent,
        OutdatedUpdate,
        FeedPaused,
        AlreadyPaused,
        NotPaused,
        NoPriceAvailable,
    ]
}

impl ErrorKind {
    /// Classifies an error raised by the engine or by a price feed.
    /// Returns `None` for errors that did not originate in either.
    pub fn of(error: &Error) -> Option<ErrorKind> {
        let code = match error {
            Error::AnchorError(inner) => inner.error_code_number,
            Error::ProgramError(_) => return None,
        };
        MarketError::all()
            .into_iter()
            .map(|e| (e.kind(), u32::from(e)))
            .chain(
                feed_errors()
                    .into_iter()
                    .map(|e| (feed_error_kind(&e), u32::from(e))),
            )
            .find(|(_, number)| *number == code)
            .map(|(kind, _)| kind)
    }
}
