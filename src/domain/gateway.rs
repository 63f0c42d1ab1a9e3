use bigdecimal::BigDecimal;

use super::order::AddressFields;

/// Card details exactly as typed by the customer. Never logged or stored.
#[derive(Clone)]
pub struct PaymentCard {
    pub holder_name: String,
    pub number: String,
    pub expire_month: String,
    pub expire_year: String,
    pub cvc: String,
}

impl std::fmt::Debug for PaymentCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let last4 = self.number.get(self.number.len().saturating_sub(4)..).unwrap_or("");
        f.debug_struct("PaymentCard")
            .field("holder_name", &self.holder_name)
            .field("number", &format_args!("**** {last4}"))
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Buyer {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: String,
    pub identity_number: String,
    pub ip: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasketLine {
    pub id: String,
    pub name: String,
    pub price: BigDecimal,
}

/// A charge for one order, as handed to the gateway.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub order_number: String,
    /// Sum of `basket`; the gateway rejects anything else.
    pub price: BigDecimal,
    /// What the card is actually charged, after code discounts.
    pub paid_price: BigDecimal,
    pub currency: String,
    pub locale: String,
    pub callback_url: Option<String>,
    pub card: PaymentCard,
    pub buyer: Buyer,
    pub address: AddressFields,
    pub basket: Vec<BasketLine>,
}

/// Fields posted back to the callback URL once the 3DS challenge is done.
#[derive(Debug, Clone)]
pub struct ThreeDsCompletion {
    pub payment_id: String,
    pub conversation_id: String,
    pub conversation_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentResult {
    pub payment_id: String,
    pub basket_id: Option<String>,
    pub paid_price: Option<BigDecimal>,
    pub currency: Option<String>,
    pub fraud_status: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinInfo {
    pub bin_number: String,
    pub card_type: Option<String>,
    pub card_association: Option<String>,
    pub card_family: Option<String>,
    pub bank_name: Option<String>,
    pub commercial: Option<bool>,
}
