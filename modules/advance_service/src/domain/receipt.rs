//! Repayment receipts
//!
//! Pure read-side formatting of one ledger entry. Nothing here touches storage.

use super::ledger::{remaining_balance, repaid_total, LedgerPosition};
use crate::contract::{AdvanceStatus, CompanyProfile, Employee, RepaymentEntry};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::fmt::Write;
use uuid::Uuid;

const RULE_WIDTH: usize = 48;
const LABEL_WIDTH: usize = 24;

/// Receipt for a single repayment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub receipt_number: String,
    pub currency: String,
    pub company: CompanyProfile,
    pub employee: ReceiptEmployee,
    pub payment: ReceiptPayment,
    pub advance: ReceiptAdvance,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptEmployee {
    pub employee_id: Uuid,
    pub name: String,
    pub employee_code: String,
    pub designation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptPayment {
    pub entry_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
    pub recorded_by: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub reversed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptAdvance {
    pub advance_id: Uuid,
    pub amount: Decimal,
    pub reason: String,
    pub payment_date: NaiveDate,
    pub status: AdvanceStatus,
    /// Active ledger sum today
    pub repaid_to_date: Decimal,
    /// Balance right after this payment was booked
    pub balance_after_payment: Decimal,
    /// Balance today
    pub current_balance: Decimal,
}

/// Receipt number derived from the payment date and entry id, e.g. `RCPT-20240315-1A2B3C4D`
pub fn receipt_number(entry: &RepaymentEntry) -> String {
    let simple = entry.id.simple().to_string().to_uppercase();
    format!(
        "RCPT-{}-{}",
        entry.payment_date.format("%Y%m%d"),
        &simple[..8]
    )
}

/// Format money as `SAR 1,234.50`
pub fn format_money(currency: &str, amount: Decimal) -> String {
    let fixed = format!("{:.2}", amount.abs().round_dp(2));
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{} {}{}.{}", currency, sign, grouped, fraction)
}

impl Receipt {
    /// Build a receipt for `entry`
    ///
    /// `ledger` holds every entry of the advance; the balance after this
    /// payment counts active entries booked up to and including it.
    pub fn build(
        entry: &RepaymentEntry,
        position: &LedgerPosition,
        ledger: &[RepaymentEntry],
        employee: &Employee,
        company: &CompanyProfile,
        currency: &str,
    ) -> Self {
        let earlier = ledger.iter().filter(|other| {
            other.id != entry.id && (other.created_at, other.id) < (entry.created_at, entry.id)
        });
        let repaid_through = repaid_total(earlier) + entry.amount;
        let advance = &position.advance;

        Self {
            receipt_number: receipt_number(entry),
            currency: currency.to_string(),
            company: company.clone(),
            employee: ReceiptEmployee {
                employee_id: employee.id,
                name: employee.full_name(),
                employee_code: employee.employee_code.clone(),
                designation: employee.designation.clone(),
            },
            payment: ReceiptPayment {
                entry_id: entry.id,
                amount: entry.amount,
                payment_date: entry.payment_date,
                notes: entry.notes.clone(),
                recorded_by: entry.recorded_by,
                recorded_at: entry.created_at,
                reversed_at: entry.reversed_at,
            },
            advance: ReceiptAdvance {
                advance_id: advance.id,
                amount: advance.amount,
                reason: advance.reason.clone(),
                payment_date: advance.payment_date,
                status: advance.status,
                repaid_to_date: position.repaid,
                balance_after_payment: remaining_balance(advance.amount, repaid_through),
                current_balance: position.remaining(),
            },
            issued_at: Utc::now(),
        }
    }

    /// Printable plain-text receipt
    pub fn render_text(&self) -> String {
        let money = |amount| format_money(&self.currency, amount);
        let rule = "-".repeat(RULE_WIDTH);
        let mut out = String::new();

        // writeln! into a String cannot fail
        let mut line = |label: &str, value: &str| {
            let _ = writeln!(out, "{:<width$}{}", label, value, width = LABEL_WIDTH);
        };

        line("", &self.company.name);
        if !self.company.address.is_empty() {
            line("", &self.company.address);
        }
        if !self.company.phone.is_empty() {
            line("Tel:", &self.company.phone);
        }
        if !self.company.email.is_empty() {
            line("Email:", &self.company.email);
        }
        line("", &"=".repeat(RULE_WIDTH));
        line("", "ADVANCE REPAYMENT RECEIPT");
        line("Receipt No:", &self.receipt_number);
        line("Date:", &self.payment.payment_date.format("%Y-%m-%d").to_string());
        if let Some(reversed_at) = self.payment.reversed_at {
            line("Status:", &format!("REVERSED {}", reversed_at.format("%Y-%m-%d")));
        }
        line("", &rule);
        line(
            "Employee:",
            &format!("{} ({})", self.employee.name, self.employee.employee_code),
        );
        if let Some(designation) = &self.employee.designation {
            line("Designation:", designation);
        }
        line("", &rule);
        line("Advance Amount:", &money(self.advance.amount));
        line("Advance Reason:", &self.advance.reason);
        line(
            "Advance Date:",
            &self.advance.payment_date.format("%Y-%m-%d").to_string(),
        );
        line("", &rule);
        line("Amount Paid:", &money(self.payment.amount));
        line("Balance After Payment:", &money(self.advance.balance_after_payment));
        line("Repaid To Date:", &money(self.advance.repaid_to_date));
        line("Current Balance:", &money(self.advance.current_balance));
        if let Some(notes) = &self.payment.notes {
            line("Notes:", notes);
        }
        line("Recorded By:", &self.payment.recorded_by.to_string());
        line(
            "Recorded At:",
            &self.payment.recorded_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        );
        line("", &rule);

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::Advance;
    use chrono::Duration;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn employee() -> Employee {
        Employee {
            id: Uuid::new_v4(),
            employee_code: "EMP-0042".to_string(),
            first_name: "Aisha".to_string(),
            last_name: "Rahman".to_string(),
            designation: Some("Site Engineer".to_string()),
            basic_salary: None,
            created_at: Utc::now(),
        }
    }

    fn advance(employee: &Employee) -> Advance {
        let now = Utc::now();
        Advance {
            id: Uuid::new_v4(),
            employee_id: employee.id,
            amount: dec("1000"),
            reason: "Family emergency".to_string(),
            status: AdvanceStatus::PartiallyRepaid,
            payment_date: date(2024, 3, 1),
            monthly_deduction: Some(dec("200")),
            repayment_date: None,
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            paid_by: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn entry(advance: &Advance, amount: &str, minutes: i64) -> RepaymentEntry {
        RepaymentEntry {
            id: Uuid::new_v4(),
            advance_id: advance.id,
            employee_id: advance.employee_id,
            amount: dec(amount),
            payment_date: date(2024, 3, 15),
            notes: Some("March payroll".to_string()),
            recorded_by: Uuid::new_v4(),
            created_at: Utc::now() + Duration::minutes(minutes),
            reversed_by: None,
            reversed_at: None,
            reversal_reason: None,
        }
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money("SAR", dec("1234.5")), "SAR 1,234.50");
        assert_eq!(format_money("SAR", dec("0")), "SAR 0.00");
        assert_eq!(format_money("SAR", dec("999")), "SAR 999.00");
        assert_eq!(format_money("USD", dec("1234567.891")), "USD 1,234,567.89");
        assert_eq!(format_money("SAR", dec("-1500")), "SAR -1,500.00");
    }

    #[test]
    fn test_receipt_number_format() {
        let emp = employee();
        let adv = advance(&emp);
        let e = entry(&adv, "300", 0);

        let number = receipt_number(&e);
        assert!(number.starts_with("RCPT-20240315-"));
        assert_eq!(number.len(), "RCPT-20240315-".len() + 8);
    }

    #[test]
    fn test_balance_after_payment_uses_earlier_entries() {
        let emp = employee();
        let adv = advance(&emp);
        let first = entry(&adv, "300", 0);
        let second = entry(&adv, "200", 1);
        let ledger = vec![first.clone(), second.clone()];
        let position = LedgerPosition::from_entries(adv, &ledger);

        let receipt = Receipt::build(
            &first,
            &position,
            &ledger,
            &emp,
            &CompanyProfile::default(),
            "SAR",
        );
        assert_eq!(receipt.advance.balance_after_payment, dec("700"));
        assert_eq!(receipt.advance.current_balance, dec("500"));
        assert_eq!(receipt.advance.repaid_to_date, dec("500"));

        let receipt = Receipt::build(
            &second,
            &position,
            &ledger,
            &emp,
            &CompanyProfile::default(),
            "SAR",
        );
        assert_eq!(receipt.advance.balance_after_payment, dec("500"));
    }

    #[test]
    fn test_render_text() {
        let emp = employee();
        let adv = advance(&emp);
        let e = entry(&adv, "1234.5", 0);
        let ledger = vec![e.clone()];
        let position = LedgerPosition::from_entries(adv, &ledger);
        let company = CompanyProfile {
            name: "Acme Contracting".to_string(),
            address: "King Fahd Road, Riyadh".to_string(),
            phone: "+966 11 000 0000".to_string(),
            email: "payroll@acme.example".to_string(),
        };

        let text = Receipt::build(&e, &position, &ledger, &emp, &company, "SAR").render_text();
        assert!(text.contains("Acme Contracting"));
        assert!(text.contains("ADVANCE REPAYMENT RECEIPT"));
        assert!(text.contains("Aisha Rahman (EMP-0042)"));
        assert!(text.contains("SAR 1,234.50"));
        assert!(text.contains("2024-03-15"));
        assert!(text.contains("March payroll"));
        assert!(!text.contains("REVERSED"));
    }
}
