//! Generation credits and the simulated purchase flow.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use jornada_db::models::{User, UserRole};
use jornada_db::store::RecordStore;

use crate::error::ServiceError;
use crate::session::Session;

/// Spend one credit of the session user.
///
/// Decrements by exactly one and bumps the generation count only when the
/// balance is positive; otherwise returns `Ok(None)` and changes nothing.
pub async fn deduct_credit(
    store: &dyn RecordStore,
    session: &Session,
) -> Result<Option<User>, ServiceError> {
    let user = store.deduct_credit(session.user.id).await?;
    match &user {
        Some(u) => info!(user_id = %u.id, credits = u.credits, "deducted credit"),
        None => info!(user_id = %session.user.id, "no credit to deduct"),
    }
    Ok(user)
}

// ---------------------------------------------------------------------------
// Packages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditPackage {
    #[serde(rename = "single")]
    Single,
    #[serde(rename = "pack_5")]
    Pack5,
    #[serde(rename = "pack_20")]
    Pack20,
}

impl CreditPackage {
    pub const ALL: [CreditPackage; 3] = [Self::Single, Self::Pack5, Self::Pack20];

    pub fn credits(self) -> i32 {
        match self {
            Self::Single => 1,
            Self::Pack5 => 5,
            Self::Pack20 => 20,
        }
    }

    /// Price in cents.
    pub fn price_cents(self) -> u32 {
        match self {
            Self::Single => 1_990,
            Self::Pack5 => 8_990,
            Self::Pack20 => 29_990,
        }
    }
}

impl fmt::Display for CreditPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Single => "single",
            Self::Pack5 => "pack_5",
            Self::Pack20 => "pack_20",
        };
        f.write_str(s)
    }
}

impl FromStr for CreditPackage {
    type Err = CreditPackageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "pack_5" => Ok(Self::Pack5),
            "pack_20" => Ok(Self::Pack20),
            other => Err(CreditPackageParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`CreditPackage`] string.
#[derive(Debug, Clone)]
pub struct CreditPackageParseError(pub String);

impl fmt::Display for CreditPackageParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid credit package: {:?}", self.0)
    }
}

impl std::error::Error for CreditPackageParseError {}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    pub reference: String,
    pub amount_cents: u32,
    pub charged_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("card declined")]
    Declined,
    #[error("payment provider unavailable: {0}")]
    Unavailable(String),
}

/// Charges a user for a package. Real processors are out of scope; the
/// server ships with [`SimulatedGateway`].
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(
        &self,
        user_id: Uuid,
        amount_cents: u32,
        description: &str,
    ) -> Result<PaymentReceipt, PaymentError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn PaymentGateway) {}
};

/// Approves (or declines) every charge without contacting anyone.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGateway {
    decline: bool,
}

impl SimulatedGateway {
    pub fn approving() -> Self {
        Self { decline: false }
    }

    pub fn declining() -> Self {
        Self { decline: true }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(
        &self,
        user_id: Uuid,
        amount_cents: u32,
        description: &str,
    ) -> Result<PaymentReceipt, PaymentError> {
        if self.decline {
            return Err(PaymentError::Declined);
        }
        info!(%user_id, amount_cents, description, "simulated charge approved");
        Ok(PaymentReceipt {
            reference: format!("sim_{}", Uuid::new_v4().simple()),
            amount_cents,
            charged_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Purchase {
    pub user: User,
    pub package: CreditPackage,
    pub receipt: PaymentReceipt,
}

/// Charge the session mentor for `package` and add its credits.
pub async fn purchase_credits(
    store: &dyn RecordStore,
    gateway: &dyn PaymentGateway,
    session: &Session,
    package: CreditPackage,
) -> Result<Purchase, ServiceError> {
    session.require_role(UserRole::Mentor)?;

    let description = format!("{} credit package ({} credits)", package, package.credits());
    let receipt = gateway
        .charge(session.user.id, package.price_cents(), &description)
        .await
        .map_err(|e| {
            warn!(user_id = %session.user.id, %package, error = %e, "payment failed");
            ServiceError::Payment(e.to_string())
        })?;

    let user = store
        .add_credits(session.user.id, package.credits())
        .await?
        .ok_or_else(|| ServiceError::NotFound("user".to_string()))?;
    info!(user_id = %user.id, %package, credits = user.credits, reference = %receipt.reference, "credits purchased");

    Ok(Purchase {
        user,
        package,
        receipt,
    })
}
