use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};

use crate::domain::errors::DomainError;
use crate::domain::gateway::{
    BasketLine, BinInfo, Buyer, PaymentCard, PaymentRequest, PaymentResult, ThreeDsCompletion,
};
use crate::domain::order::{confirmation_of, Confirmation, OrderStatus, OrderView, PaymentType};
use crate::domain::payment::PaymentAttempt;
use crate::domain::ports::{OrderRepository, PaymentGateway};

#[derive(Debug, Clone)]
pub struct PaymentSettings {
    pub currency: String,
    pub locale: String,
    pub callback_url: String,
}

/// What the storefront collects on the card form.
#[derive(Debug, Clone)]
pub struct CardCheckout {
    pub order_number: String,
    pub card: PaymentCard,
    pub identity_number: String,
    pub ip: String,
}

/// Form fields the gateway posts to the callback URL after the challenge.
#[derive(Debug, Clone)]
pub struct ThreeDsCallback {
    pub status: String,
    pub payment_id: Option<String>,
    pub conversation_id: String,
    pub conversation_data: Option<String>,
    pub md_status: Option<String>,
}

impl ThreeDsCallback {
    fn challenge_passed(&self) -> bool {
        self.status == "success" && self.md_status.as_deref().map_or(true, |s| s == "1")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub order_number: String,
    pub payment_id: String,
    pub confirmation: Confirmation,
}

pub struct PaymentService {
    orders: Arc<dyn OrderRepository>,
    gateway: Arc<dyn PaymentGateway>,
    settings: PaymentSettings,
}

impl PaymentService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        gateway: Arc<dyn PaymentGateway>,
        settings: PaymentSettings,
    ) -> Self {
        Self {
            orders,
            gateway,
            settings,
        }
    }

    /// Starts a 3-D Secure payment and returns the provider's auto-submitting
    /// challenge page, byte for byte.
    pub async fn start_three_ds(&self, checkout: CardCheckout) -> Result<String, DomainError> {
        let order = self.payable_order(&checkout.order_number).await?;
        let request = self.payment_request(&order, checkout, Some(self.settings.callback_url.clone()))?;

        let mut attempt = PaymentAttempt::new(&order.order_number);
        attempt.request_sent()?;
        match self.gateway.initialize_three_ds(&request).await {
            Ok(html) => {
                attempt.redirect_to_challenge()?;
                log::info!("3DS challenge issued for order {}", order.order_number);
                Ok(html)
            }
            Err(e) => {
                attempt.fail();
                log::warn!("3DS initialization for order {} failed: {}", order.order_number, e);
                Err(e)
            }
        }
    }

    /// Finishes a 3-D Secure payment once the gateway posts back.
    pub async fn complete_three_ds(
        &self,
        callback: ThreeDsCallback,
    ) -> Result<PaymentOutcome, DomainError> {
        let order_number = callback.conversation_id.clone();
        let mut attempt = PaymentAttempt::resume_after_challenge(&order_number);

        let payment_id = match (&callback.payment_id, callback.challenge_passed()) {
            (Some(id), true) => id.clone(),
            _ => {
                attempt.fail();
                log::warn!(
                    "3DS challenge for order {} failed (status={}, mdStatus={:?})",
                    order_number,
                    callback.status,
                    callback.md_status
                );
                return Err(DomainError::Gateway {
                    code: callback.md_status.unwrap_or_else(|| "3DS".to_string()),
                    message: "3-D Secure authentication failed".to_string(),
                });
            }
        };

        let order = self.card_order(&order_number).await?;
        if order.status != OrderStatus::Pending {
            attempt.fail();
            let confirmation = confirmation_of(
                &order_number,
                order.status,
                order.gateway_payment_id.as_deref(),
                &payment_id,
            )?;
            return Ok(PaymentOutcome {
                order_number,
                payment_id,
                confirmation,
            });
        }

        attempt.request_sent()?;
        let completion = ThreeDsCompletion {
            payment_id,
            conversation_id: order_number.clone(),
            conversation_data: callback.conversation_data,
        };
        let result = match self.gateway.complete_three_ds(&completion).await {
            Ok(result) => result,
            Err(e) => {
                attempt.fail();
                log::warn!("3DS auth for order {} failed: {}", order_number, e);
                return Err(e);
            }
        };
        attempt.direct_result()?;

        self.settle(attempt, &order, result).await
    }

    /// Charges a card without a 3-D Secure challenge.
    pub async fn pay_direct(&self, checkout: CardCheckout) -> Result<PaymentOutcome, DomainError> {
        let order = self.payable_order(&checkout.order_number).await?;
        let request = self.payment_request(&order, checkout, None)?;

        let mut attempt = PaymentAttempt::new(&order.order_number);
        attempt.request_sent()?;
        let result = match self.gateway.authorize(&request).await {
            Ok(result) => result,
            Err(e) => {
                attempt.fail();
                log::warn!("Card payment for order {} failed: {}", order.order_number, e);
                return Err(e);
            }
        };
        attempt.direct_result()?;

        self.settle(attempt, &order, result).await
    }

    pub async fn check_bin(&self, bin_number: &str) -> Result<BinInfo, DomainError> {
        let bin = bin_number.trim();
        if !(6..=8).contains(&bin.len()) || !bin.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::InvalidInput("bin_number must be 6 to 8 digits".into()));
        }
        self.gateway.check_bin(bin).await
    }

    pub async fn payment_detail(&self, payment_id: &str) -> Result<PaymentResult, DomainError> {
        if payment_id.trim().is_empty() {
            return Err(DomainError::InvalidInput("payment_id is required".into()));
        }
        self.gateway.payment_detail(payment_id).await
    }

    /// Checks the gateway's result against the order and marks it paid.
    async fn settle(
        &self,
        mut attempt: PaymentAttempt,
        order: &OrderView,
        result: PaymentResult,
    ) -> Result<PaymentOutcome, DomainError> {
        if let Err(e) = verify_result(order, &result) {
            attempt.fail();
            log::warn!("Gateway result for order {} rejected: {}", order.order_number, e);
            return Err(e);
        }

        let order_number = order.order_number.clone();
        let payment_id = result.payment_id.clone();
        let confirmation = {
            let (number, id) = (order_number.clone(), payment_id.clone());
            self.blocking(move |repo| repo.confirm_payment(&number, &id)).await?
        };
        attempt.confirm()?;

        match confirmation {
            Confirmation::Confirmed => {
                log::info!("Order {} paid (payment {})", order_number, payment_id)
            }
            Confirmation::AlreadyConfirmed => {
                log::info!("Order {} was already paid; confirmation skipped", order_number)
            }
        }
        Ok(PaymentOutcome {
            order_number,
            payment_id,
            confirmation,
        })
    }

    async fn card_order(&self, order_number: &str) -> Result<OrderView, DomainError> {
        let number = order_number.to_string();
        let order = self
            .blocking(move |repo| repo.find_by_number(&number))
            .await?
            .ok_or(DomainError::NotFound("Order"))?;
        if order.payment_type != PaymentType::Card {
            return Err(DomainError::Conflict(format!(
                "order {order_number} is not a card order"
            )));
        }
        Ok(order)
    }

    async fn payable_order(&self, order_number: &str) -> Result<OrderView, DomainError> {
        let order = self.card_order(order_number).await?;
        if order.status != OrderStatus::Pending {
            return Err(DomainError::Conflict(format!(
                "order {order_number} is {} and cannot be paid",
                order.status
            )));
        }
        if order.price_at_gateway <= BigDecimal::zero() {
            return Err(DomainError::Conflict(format!(
                "order {order_number} has nothing to charge"
            )));
        }
        Ok(order)
    }

    fn payment_request(
        &self,
        order: &OrderView,
        checkout: CardCheckout,
        callback_url: Option<String>,
    ) -> Result<PaymentRequest, DomainError> {
        let address = order
            .address
            .clone()
            .ok_or_else(|| DomainError::Internal(format!("order {} has no address", order.order_number)))?;

        let basket: Vec<BasketLine> = order
            .items
            .iter()
            .filter(|i| i.line_total > BigDecimal::zero())
            .map(|i| BasketLine {
                id: i.variant_id.to_string(),
                name: i.name.clone(),
                price: i.line_total.clone(),
            })
            .collect();
        let price: BigDecimal = basket.iter().map(|l| &l.price).sum();

        let (name, surname) = split_name(&address.full_name);
        let buyer = Buyer {
            id: order
                .customer_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| format!("guest-{}", order.order_number)),
            name,
            surname,
            email: address.email.clone(),
            phone: address.phone.clone(),
            identity_number: checkout.identity_number,
            ip: checkout.ip,
        };

        Ok(PaymentRequest {
            order_number: order.order_number.clone(),
            price,
            paid_price: order.price_at_gateway.clone(),
            currency: self.settings.currency.clone(),
            locale: self.settings.locale.clone(),
            callback_url,
            card: checkout.card,
            buyer,
            address,
            basket,
        })
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn OrderRepository) -> Result<T, DomainError> + Send + 'static,
    {
        let repo = self.orders.clone();
        tokio::task::spawn_blocking(move || f(repo.as_ref()))
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?
    }
}

fn verify_result(order: &OrderView, result: &PaymentResult) -> Result<(), DomainError> {
    if let Some(basket_id) = &result.basket_id {
        if basket_id != &order.order_number {
            return Err(DomainError::Gateway {
                code: "BASKET_MISMATCH".into(),
                message: format!("gateway settled basket {basket_id}"),
            });
        }
    }
    if let Some(paid) = &result.paid_price {
        if paid != &order.price_at_gateway {
            return Err(DomainError::Gateway {
                code: "AMOUNT_MISMATCH".into(),
                message: format!("gateway charged {paid}, expected {}", order.price_at_gateway),
            });
        }
    }
    Ok(())
}

/// The gateway wants given name and surname separately.
fn split_name(full_name: &str) -> (String, String) {
    let full_name = full_name.trim();
    match full_name.rsplit_once(char::is_whitespace) {
        Some((name, surname)) => (name.trim().to_string(), surname.to_string()),
        None => (full_name.to_string(), full_name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::order_service::OrderService;
    use crate::domain::assembler::OrderAssembler;
    use crate::domain::order::StatusTransition;
    use crate::testing::{self, FakeGateway, InMemoryStore};

    fn settings() -> PaymentSettings {
        PaymentSettings {
            currency: "TRY".into(),
            locale: "tr".into(),
            callback_url: "https://shop.example.com/payments/3ds/callback".into(),
        }
    }

    fn setup(gateway: FakeGateway) -> (Arc<InMemoryStore>, Arc<FakeGateway>, PaymentService) {
        let store = Arc::new(InMemoryStore::default());
        let gateway = Arc::new(gateway);
        let service = PaymentService::new(store.clone(), gateway.clone(), settings());
        (store, gateway, service)
    }

    fn place(store: &Arc<InMemoryStore>, prices: &[&str], code: Option<&str>) -> String {
        let variants: Vec<_> = prices.iter().map(|p| store.add_variant(p, "0", "0")).collect();
        let mut request = testing::guest_order(&variants);
        request.discount_code = code.map(str::to_string);
        OrderService::new(store.clone(), OrderAssembler::default())
            .create_order(request)
            .unwrap()
            .order_number
    }

    fn checkout(order_number: &str) -> CardCheckout {
        CardCheckout {
            order_number: order_number.to_string(),
            card: testing::card(),
            identity_number: "74300864791".into(),
            ip: "85.34.78.112".into(),
        }
    }

    fn callback(order_number: &str, status: &str, md_status: &str) -> ThreeDsCallback {
        ThreeDsCallback {
            status: status.into(),
            payment_id: Some("pay-1".into()),
            conversation_id: order_number.into(),
            conversation_data: None,
            md_status: Some(md_status.into()),
        }
    }

    #[tokio::test]
    async fn three_ds_start_passes_html_through_and_sends_basket() {
        let (store, gateway, service) = setup(FakeGateway::default());
        store.add_discount("TEN", "FIXED", "10", None);
        let number = place(&store, &["50", "150"], Some("TEN"));

        let html = service.start_three_ds(checkout(&number)).await.unwrap();
        assert_eq!(html, testing::THREE_DS_HTML);

        let sent = gateway.last_request().expect("request sent");
        assert_eq!(sent.order_number, number);
        assert_eq!(sent.price, BigDecimal::from(200));
        assert_eq!(sent.paid_price, BigDecimal::from(190));
        assert_eq!(sent.basket.len(), 2);
        assert_eq!(sent.buyer.name, "Ada");
        assert_eq!(sent.buyer.surname, "Lovelace");
        assert_eq!(sent.callback_url.as_deref(), Some(settings().callback_url.as_str()));
    }

    #[tokio::test]
    async fn gateway_rejection_leaves_order_pending() {
        let (store, _, service) = setup(FakeGateway::rejecting("10051", "Insufficient funds"));
        let number = place(&store, &["20"], None);

        let err = service.start_three_ds(checkout(&number)).await.unwrap_err();
        assert!(matches!(err, DomainError::Gateway { ref code, .. } if code == "10051"));
        assert!(err.is_retryable());
        assert_eq!(store.status_of(&number), OrderStatus::Pending);
    }

    #[tokio::test]
    async fn unreachable_gateway_is_reported_distinctly() {
        let (store, _, service) = setup(FakeGateway::unreachable());
        let number = place(&store, &["20"], None);

        let err = service.pay_direct(checkout(&number)).await.unwrap_err();
        assert_eq!(err.code(), "THIRD_PARTY_UNAVAILABLE");
    }

    #[tokio::test]
    async fn successful_challenge_confirms_once() {
        let (store, gateway, service) = setup(FakeGateway::default());
        let number = place(&store, &["20"], None);
        gateway.settle_as(&number, "20");

        let first = service
            .complete_three_ds(callback(&number, "success", "1"))
            .await
            .unwrap();
        assert_eq!(first.confirmation, Confirmation::Confirmed);
        assert_eq!(store.status_of(&number), OrderStatus::Paid);

        let second = service
            .complete_three_ds(callback(&number, "success", "1"))
            .await
            .unwrap();
        assert_eq!(second.confirmation, Confirmation::AlreadyConfirmed);
        assert_eq!(gateway.auth_calls(), 1);
    }

    #[tokio::test]
    async fn cancelled_order_is_not_charged_after_the_challenge() {
        let (store, gateway, service) = setup(FakeGateway::default());
        let number = place(&store, &["20"], None);
        OrderService::new(store.clone(), OrderAssembler::default())
            .transition(&number, StatusTransition::Cancel)
            .unwrap();

        let err = service
            .complete_three_ds(callback(&number, "success", "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(gateway.auth_calls(), 0);
        assert_eq!(store.status_of(&number), OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn order_paid_by_another_payment_is_a_conflict() {
        let (store, gateway, service) = setup(FakeGateway::default());
        let number = place(&store, &["20"], None);
        service.pay_direct(checkout(&number)).await.unwrap();

        let err = service
            .complete_three_ds(callback(&number, "success", "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(gateway.auth_calls(), 1);
    }

    #[tokio::test]
    async fn failed_challenge_never_reaches_the_gateway() {
        let (store, gateway, service) = setup(FakeGateway::default());
        let number = place(&store, &["20"], None);

        let err = service
            .complete_three_ds(callback(&number, "failure", "0"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "THIRD_PARTY_FAILURE");
        assert_eq!(gateway.auth_calls(), 0);
        assert_eq!(store.status_of(&number), OrderStatus::Pending);
    }

    #[tokio::test]
    async fn amount_mismatch_is_not_confirmed() {
        let (store, gateway, service) = setup(FakeGateway::default());
        let number = place(&store, &["20"], None);
        gateway.settle_as(&number, "19.99");

        let err = service
            .complete_three_ds(callback(&number, "success", "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Gateway { ref code, .. } if code == "AMOUNT_MISMATCH"));
        assert_eq!(store.status_of(&number), OrderStatus::Pending);
    }

    #[tokio::test]
    async fn direct_payment_confirms_order() {
        let (store, gateway, service) = setup(FakeGateway::default());
        let number = place(&store, &["12.50", "7.50"], None);
        gateway.settle_as(&number, "20.00");

        let outcome = service.pay_direct(checkout(&number)).await.unwrap();
        assert_eq!(outcome.confirmation, Confirmation::Confirmed);
        assert_eq!(store.status_of(&number), OrderStatus::Paid);
    }

    #[tokio::test]
    async fn paid_or_transfer_orders_cannot_be_charged() {
        let (store, gateway, service) = setup(FakeGateway::default());
        let number = place(&store, &["20"], None);
        gateway.settle_as(&number, "20");
        service.pay_direct(checkout(&number)).await.unwrap();

        assert!(matches!(
            service.pay_direct(checkout(&number)).await,
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            service.start_three_ds(checkout("ORD-240101-0000000000")).await,
            Err(DomainError::NotFound("Order"))
        ));
    }

    #[tokio::test]
    async fn bin_number_is_validated_before_calling_out() {
        let (_, gateway, service) = setup(FakeGateway::default());
        assert!(service.check_bin("12ab56").await.is_err());
        assert!(service.check_bin("12345").await.is_err());

        let info = service.check_bin("552879").await.unwrap();
        assert_eq!(info.bin_number, "552879");
        assert_eq!(gateway.bin_calls(), 1);
    }

    #[test]
    fn names_split_on_last_space() {
        assert_eq!(split_name("Ada King Lovelace"), ("Ada King".into(), "Lovelace".into()));
        assert_eq!(split_name("Cher"), ("Cher".into(), "Cher".into()));
    }

    #[test]
    fn callback_requires_md_status_one() {
        let number = "ORD-240101-0000000000";
        assert!(callback(number, "success", "1").challenge_passed());
        assert!(!callback(number, "success", "0").challenge_passed());
        assert!(!callback(number, "failure", "1").challenge_passed());
    }
}
