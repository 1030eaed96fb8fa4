use serde::{Deserialize, Serialize};
use url::Url;

use crate::catalog::Catalog;
use crate::shared_wheel_game::SpinSession;

const WHATSAPP_BASE_URL: &str = "https://wa.me/";
const CODE_PLACEHOLDER: &str = "{code}";

/// Where a revealed coupon can be redeemed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CouponActions {
    pub purchase_url: String,
    /// Digits only, country code first.
    pub whatsapp_number: String,
    /// Message text; `{code}` is replaced with the coupon code.
    pub whatsapp_template: String,
}

/// Coupon codes are shown and redeemed uppercase.
pub fn coupon_code(reward_code: &str) -> String {
    reward_code.to_uppercase()
}

impl CouponActions {
    pub fn whatsapp_message(&self, reward_code: &str) -> String {
        self.whatsapp_template
            .replace(CODE_PLACEHOLDER, &coupon_code(reward_code))
    }

    pub fn whatsapp_link(&self, reward_code: &str) -> Result<Url, url::ParseError> {
        let base = format!("{}{}", WHATSAPP_BASE_URL, self.whatsapp_number);
        Url::parse_with_params(&base, &[("text", self.whatsapp_message(reward_code))])
    }

    /// Everything a host needs to show and act on the prize. `None` until the
    /// session has revealed, and for a reveal that carries no reward.
    pub fn reveal(&self, session: &SpinSession, catalog: &Catalog) -> Option<RevealedReward> {
        let result = session.draw_result()?;
        let reward = catalog.get(&result.reward_code)?;
        let whatsapp_url = match self.whatsapp_link(&reward.code) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                log::error!("Invalid WhatsApp link for {}: {}", reward.code, e);
                None
            }
        };

        Some(RevealedReward {
            code: coupon_code(&reward.code),
            label: reward.label.clone(),
            purchase_url: self.purchase_url.clone(),
            whatsapp_url,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RevealedReward {
    pub code: String,
    pub label: String,
    pub purchase_url: String,
    pub whatsapp_url: Option<String>,
}
