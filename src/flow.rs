// Guest session, forward only; a failed session can be retried or abandoned

use crate::api::{NewTip, OrderData, Recipient, TipQuote};
use crate::calculator::{self, Selection};
use crate::errors::{Error, Result};
use crate::store::MAX_COMMENT_CHARS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CodeInput,
    Initialization,
    OrderLookup,
    Rating,
    AmountSelection,
    PaymentConsent,
    Submit,
    ThankYou,
    Failed,
}

/// State of one tipping session
#[derive(Debug, Clone)]
pub struct TipFlow {
    stage: Stage,
    code: Option<String>,
    order: Option<OrderData>,
    rating: Option<u8>,
    comment: Option<String>,
    selection: Option<Selection>,
    quote: Option<TipQuote>,
    tip_id: Option<String>,
    error: Option<String>,
}

impl Default for TipFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl TipFlow {
    pub fn new() -> Self {
        TipFlow {
            stage: Stage::CodeInput,
            code: None,
            order: None,
            rating: None,
            comment: None,
            selection: None,
            quote: None,
            tip_id: None,
            error: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn order(&self) -> Option<&OrderData> {
        self.order.as_ref()
    }

    pub fn quote(&self) -> Option<&TipQuote> {
        self.quote.as_ref()
    }

    pub fn tip_id(&self) -> Option<&str> {
        self.tip_id.as_deref()
    }

    /// Message of the last failure, while in the Failed stage
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn require(&self, stage: Stage) -> Result<()> {
        if self.stage == stage {
            Ok(())
        } else {
            Err(Error::Validation(format!(
                "Unexpected step: session is at {:?}, expected {:?}",
                self.stage, stage
            )))
        }
    }

    pub fn enter_code(&mut self, code: &str) -> Result<()> {
        self.require(Stage::CodeInput)?;
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::Validation(crate::orders::MISSING_CODE.to_string()));
        }
        self.code = Some(code.to_string());
        self.stage = Stage::Initialization;
        Ok(())
    }

    /// The link was accepted, the order can be fetched
    pub fn link_checked(&mut self) -> Result<()> {
        self.require(Stage::Initialization)?;
        self.stage = Stage::OrderLookup;
        Ok(())
    }

    pub fn order_loaded(&mut self, order: OrderData) -> Result<()> {
        self.require(Stage::OrderLookup)?;
        self.order = Some(order);
        self.stage = Stage::Rating;
        Ok(())
    }

    pub fn rate(&mut self, rating: u8, comment: Option<String>) -> Result<()> {
        self.require(Stage::Rating)?;
        if !(1..=5).contains(&rating) {
            return Err(Error::Validation(crate::store::INVALID_DATA.to_string()));
        }
        let comment = comment.filter(|c| !c.trim().is_empty());
        if comment
            .as_ref()
            .is_some_and(|c| c.chars().count() > MAX_COMMENT_CHARS)
        {
            return Err(Error::Validation(crate::store::INVALID_DATA.to_string()));
        }
        self.rating = Some(rating);
        self.comment = comment;
        self.stage = Stage::AmountSelection;
        Ok(())
    }

    /// Pick the amount. The quote is computed without commission until consent is given.
    pub fn select_amount(&mut self, selection: Selection) -> Result<()> {
        self.require(Stage::AmountSelection)?;
        let base = self.order_amount()?;
        self.quote = Some(calculator::quote(base, selection, false)?);
        self.selection = Some(selection);
        self.stage = Stage::PaymentConsent;
        Ok(())
    }

    pub fn consent(&mut self, pay_commission: bool) -> Result<()> {
        self.require(Stage::PaymentConsent)?;
        let base = self.order_amount()?;
        let selection = self
            .selection
            .ok_or_else(|| Error::Validation("No amount selected".to_string()))?;
        self.quote = Some(calculator::quote(base, selection, pay_commission)?);
        self.stage = Stage::Submit;
        Ok(())
    }

    /// Body of the tip request for the current session
    pub fn submission(&self) -> Result<NewTip> {
        self.require(Stage::Submit)?;
        let order = self
            .order
            .as_ref()
            .ok_or_else(|| Error::Validation("No order loaded".to_string()))?;
        let quote = self
            .quote
            .ok_or_else(|| Error::Validation("No amount selected".to_string()))?;

        let (waiter_id, waiter_name) = match &order.recipient {
            Recipient::Waiter(waiter) => {
                let full_name = match &waiter.surname {
                    Some(surname) => format!("{} {}", waiter.name, surname),
                    None => waiter.name.clone(),
                };
                (Some(waiter.id.clone()), Some(full_name))
            }
            Recipient::Team(_) => (None, None),
        };

        Ok(NewTip {
            code: self.code.clone(),
            amount: Some(quote.tip_amount as i64),
            rating: self.rating.map(i64::from),
            comment: self.comment.clone(),
            recipient_type: Some(order.recipient.recipient_type().as_str().to_string()),
            waiter_id,
            waiter_name,
            restaurant_name: Some(order.order.restaurant.clone()),
        })
    }

    pub fn submitted(&mut self, tip_id: &str) -> Result<()> {
        self.require(Stage::Submit)?;
        self.tip_id = Some(tip_id.to_string());
        self.stage = Stage::ThankYou;
        Ok(())
    }

    /// Move to the Failed stage. A finished session cannot fail anymore.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        if matches!(self.stage, Stage::ThankYou | Stage::Failed) {
            return Err(Error::Validation(format!(
                "Cannot fail a session at {:?}",
                self.stage
            )));
        }
        self.error = Some(message.into());
        self.stage = Stage::Failed;
        Ok(())
    }

    /// Start over from the link check with the same code
    pub fn retry(&mut self) -> Result<()> {
        self.require(Stage::Failed)?;
        let code = self.code.take();
        *self = TipFlow::new();
        match code {
            Some(code) => {
                self.code = Some(code);
                self.stage = Stage::Initialization;
            }
            None => self.stage = Stage::CodeInput,
        }
        Ok(())
    }

    /// Give up and go back home
    pub fn abandon(&mut self) -> Result<()> {
        self.require(Stage::Failed)?;
        *self = TipFlow::new();
        Ok(())
    }

    fn order_amount(&self) -> Result<u64> {
        self.order
            .as_ref()
            .map(|o| o.order.order_amount)
            .ok_or_else(|| Error::Validation("No order loaded".to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::database::mock::MockDB;
    use crate::database::{default_roster, seed_employees, Database};
    use crate::orders::order_data;
    use chrono::Utc;

    fn loaded(code: &str) -> TipFlow {
        let mut db = MockDB::new().unwrap();
        seed_employees(&mut db, &default_roster()).unwrap();

        let mut flow = TipFlow::new();
        flow.enter_code(code).unwrap();
        flow.link_checked().unwrap();
        flow.order_loaded(order_data(&db, code, Utc::now()).unwrap())
            .unwrap();
        flow
    }

    #[test]
    fn test_happy_path() {
        let mut flow = loaded("TEST001");
        assert_eq!(flow.stage(), Stage::Rating);

        flow.rate(5, Some("Спасибо!".to_string())).unwrap();
        flow.select_amount(Selection::Percentage(10)).unwrap();
        assert_eq!(flow.quote().unwrap().total, 250);

        flow.consent(true).unwrap();
        let quote = flow.quote().unwrap();
        assert_eq!(quote.tip_amount, 250);
        assert_eq!(quote.commission, 15);
        assert_eq!(quote.total, 265);

        let tip = flow.submission().unwrap();
        assert_eq!(tip.code.as_deref(), Some("TEST001"));
        assert_eq!(tip.amount, Some(250));
        assert_eq!(tip.rating, Some(5));
        assert_eq!(tip.recipient_type.as_deref(), Some("waiter"));
        assert_eq!(tip.waiter_id.as_deref(), Some("ALEX001"));
        assert_eq!(tip.waiter_name.as_deref(), Some("Алексей Петров"));

        flow.submitted("abc123").unwrap();
        assert_eq!(flow.stage(), Stage::ThankYou);
        assert_eq!(flow.tip_id(), Some("abc123"));
    }

    #[test]
    fn test_team_submission() {
        let mut flow = loaded("TEST002");
        flow.rate(4, None).unwrap();
        flow.select_amount(Selection::Custom(300)).unwrap();
        flow.consent(false).unwrap();

        let tip = flow.submission().unwrap();
        assert_eq!(tip.recipient_type.as_deref(), Some("team"));
        assert_eq!(tip.waiter_id, None);
        assert_eq!(flow.quote().unwrap().total, 300);
    }

    #[test]
    fn test_steps_cannot_be_skipped() {
        let mut flow = TipFlow::new();
        assert!(flow.link_checked().is_err());
        assert!(flow.rate(5, None).is_err());

        let mut flow = loaded("TEST001");
        assert!(flow.select_amount(Selection::Percentage(10)).is_err());
        assert!(flow.submission().is_err());
        assert!(flow.submitted("x").is_err());
        assert_eq!(flow.stage(), Stage::Rating);
    }

    #[test]
    fn test_no_going_back() {
        let mut flow = loaded("TEST001");
        flow.rate(5, None).unwrap();
        assert!(flow.rate(3, None).is_err());
        assert!(flow.enter_code("TEST003").is_err());
    }

    #[test]
    fn test_invalid_inputs_keep_the_stage() {
        let mut flow = loaded("TEST001");
        assert!(flow.rate(0, None).is_err());
        assert!(flow.rate(6, None).is_err());
        assert_eq!(flow.stage(), Stage::Rating);

        flow.rate(3, None).unwrap();
        assert!(flow.select_amount(Selection::Custom(5)).is_err());
        assert!(flow.select_amount(Selection::Percentage(7)).is_err());
        assert_eq!(flow.stage(), Stage::AmountSelection);
    }

    #[test]
    fn test_failure_retry_and_abandon() {
        let mut flow = TipFlow::new();
        flow.enter_code("TEAM001").unwrap();
        flow.fail("Ссылка недействительна или устарела").unwrap();
        assert_eq!(flow.stage(), Stage::Failed);
        assert_eq!(flow.error(), Some("Ссылка недействительна или устарела"));

        flow.retry().unwrap();
        assert_eq!(flow.stage(), Stage::Initialization);
        assert_eq!(flow.code(), Some("TEAM001"));
        assert_eq!(flow.error(), None);

        flow.fail("Внутренняя ошибка сервера").unwrap();
        flow.abandon().unwrap();
        assert_eq!(flow.stage(), Stage::CodeInput);
        assert_eq!(flow.code(), None);
    }

    #[test]
    fn test_finished_session_cannot_fail() {
        let mut flow = loaded("TEST003");
        flow.rate(5, None).unwrap();
        flow.select_amount(Selection::Percentage(5)).unwrap();
        flow.consent(true).unwrap();
        flow.submitted("done").unwrap();
        assert!(flow.fail("late error").is_err());
        assert!(flow.retry().is_err());
    }
}
