use rust_decimal::{Decimal, RoundingStrategy};
use std::{
    io::{self, Write},
    sync::Arc,
};

use super::{AccountType, Transaction};
use crate::date_format::DateFormat;

/// The first error a [`Writer`] hit. Every later call on the same writer returns a clone of it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Failed to write QIF output: {0}")]
pub struct WriteError(Arc<io::Error>);

#[cfg(test)]
impl WriteError {
    pub fn kind(&self) -> io::ErrorKind {
        self.0.kind()
    }
}

/// Streams one account's QIF file: a single header block, then one block per transaction.
///
/// Once any write fails the writer is poisoned. All further calls, including
/// [`Writer::finish`], return the original error without touching the output again.
pub struct Writer<W: Write> {
    out: W,
    date_format: DateFormat,
    account_name: String,
    account_type: AccountType,
    wrote_header: bool,
    error: Option<WriteError>,
}

impl<W: Write> Writer<W> {
    pub fn new(
        out: W,
        account_name: impl Into<String>,
        account_type: AccountType,
        date_format: DateFormat,
    ) -> Self {
        Self {
            out,
            date_format,
            account_name: account_name.into(),
            account_type,
            wrote_header: false,
            error: None,
        }
    }

    /// Writes the account header. Does nothing if the header was already written.
    pub fn write_header(&mut self) -> Result<(), WriteError> {
        self.check_poisoned()?;
        if self.wrote_header {
            return Ok(());
        }
        self.wrote_header = true;

        // No trailing newline, each transaction block starts with one.
        let result = write!(
            self.out,
            "!Account\nN{name}\nT{ty}\n^\n!Type:{ty}",
            name = self.account_name,
            ty = self.account_type,
        );
        self.record(result)
    }

    pub fn write_transaction(&mut self, transaction: &Transaction) -> Result<(), WriteError> {
        self.write_header()?;
        let result = write_transaction_block(&mut self.out, &self.date_format, transaction);
        self.record(result)
    }

    /// Writes the transactions in order and stops at the first error.
    pub fn write_transactions<'a>(
        &mut self,
        transactions: impl IntoIterator<Item = &'a Transaction>,
    ) -> Result<(), WriteError> {
        self.check_poisoned()?;
        for transaction in transactions {
            self.write_transaction(transaction)?;
        }
        Ok(())
    }

    /// Flushes and hands back the underlying output.
    pub fn finish(mut self) -> Result<W, WriteError> {
        self.check_poisoned()?;
        let result = self.out.flush();
        self.record(result)?;
        Ok(self.out)
    }

    fn check_poisoned(&self) -> Result<(), WriteError> {
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn record(&mut self, result: io::Result<()>) -> Result<(), WriteError> {
        result.map_err(|error| {
            let error = WriteError(Arc::new(error));
            self.error = Some(error.clone());
            error
        })
    }
}

fn write_transaction_block(
    out: &mut impl Write,
    date_format: &DateFormat,
    transaction: &Transaction,
) -> io::Result<()> {
    write!(
        out,
        "\nD{}\nP{}\nT{}\n",
        date_format.format(transaction.date),
        transaction.payee,
        format_amount(transaction.amount),
    )?;
    if let Some(memo) = transaction.memo.as_deref().filter(|memo| !memo.is_empty()) {
        writeln!(out, "M{memo}")?;
    }
    write!(out, "^")
}

/// Upstream amounts are positive for money leaving the account, QIF wants them negative.
fn format_amount(amount: Decimal) -> String {
    let mut amount = (-amount).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if amount.is_zero() {
        amount.set_sign_positive(true);
    }
    format!("{amount:.2}")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    const HEADER: &str = "!Account\nNtestAcct\nTCCard\n^\n!Type:CCard";

    fn date_format() -> DateFormat {
        DateFormat::new("%d/%m/%Y").unwrap()
    }

    fn writer() -> Writer<Vec<u8>> {
        Writer::new(Vec::new(), "testAcct", AccountType::CCard, date_format())
    }

    fn output(writer: Writer<Vec<u8>>) -> String {
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    fn transaction(day: u32, payee: &str, amount: Decimal, memo: Option<&str>) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2020, 1, day).unwrap(),
            payee: payee.to_string(),
            amount,
            memo: memo.map(str::to_string),
        }
    }

    struct FailingOutput {
        attempts: usize,
    }

    impl Write for FailingOutput {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.attempts += 1;
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            self.attempts += 1;
            Ok(())
        }
    }

    #[test]
    fn write_header() {
        let mut writer = writer();
        writer.write_header().unwrap();
        assert_eq!(HEADER, output(writer));
    }

    #[test]
    fn given_header_written_twice_then_output_is_identical() {
        let mut writer = writer();
        writer.write_header().unwrap();
        writer.write_header().unwrap();
        assert_eq!(HEADER, output(writer));
    }

    #[test]
    fn given_no_transactions_then_writes_nothing() {
        assert_eq!("", output(writer()));
    }

    #[test]
    fn write_transaction_with_memo() {
        let mut writer = writer();
        writer
            .write_transaction(&transaction(1, "testPayee", Decimal::new(1026, 2), Some("abcdef")))
            .unwrap();
        assert_eq!(
            format!("{HEADER}\nD01/01/2020\nPtestPayee\nT-10.26\nMabcdef\n^"),
            output(writer),
        );
    }

    #[test]
    fn write_transaction_without_memo() {
        let mut writer = writer();
        writer
            .write_transaction(&transaction(1, "testPayee", Decimal::new(1026, 2), None))
            .unwrap();
        assert_eq!(
            format!("{HEADER}\nD01/01/2020\nPtestPayee\nT-10.26\n^"),
            output(writer),
        );
    }

    #[test]
    fn given_empty_memo_then_no_memo_line() {
        let mut writer = writer();
        writer
            .write_transaction(&transaction(1, "testPayee", Decimal::new(1026, 2), Some("")))
            .unwrap();
        assert_eq!(
            format!("{HEADER}\nD01/01/2020\nPtestPayee\nT-10.26\n^"),
            output(writer),
        );
    }

    #[test]
    fn write_transactions() {
        let mut writer = writer();
        writer
            .write_transactions(&[
                transaction(1, "testPayee1", Decimal::new(1026, 2), Some("testMemo")),
                transaction(2, "testPayee2", Decimal::new(-500167, 2), None),
            ])
            .unwrap();

        let expected = "!Account
NtestAcct
TCCard
^
!Type:CCard
D01/01/2020
PtestPayee1
T-10.26
MtestMemo
^
D02/01/2020
PtestPayee2
T5001.67
^";
        assert_eq!(expected, output(writer));
    }

    #[test]
    fn date_lines_follow_configured_format() {
        let mut writer = Writer::new(
            Vec::new(),
            "Checking",
            AccountType::Bank,
            DateFormat::new("%Y-%m-%d").unwrap(),
        );
        writer
            .write_transaction(&transaction(31, "Coffee", Decimal::new(350, 2), None))
            .unwrap();
        assert_eq!(
            "!Account\nNChecking\nTBank\n^\n!Type:Bank\nD2020-01-31\nPCoffee\nT-3.50\n^",
            output(writer),
        );
    }

    #[test]
    fn amounts_always_have_two_decimals() {
        assert_eq!("-5001.60", format_amount(Decimal::new(50016, 1)));
        assert_eq!("12.00", format_amount(Decimal::new(-12, 0)));
        assert_eq!("0.00", format_amount(Decimal::ZERO));
        assert_eq!("0.00", format_amount(Decimal::new(-1, 3)));
        assert_eq!("-1.01", format_amount(Decimal::new(1005, 3)));
        assert_eq!("-1234567.89", format_amount(Decimal::new(123456789, 2)));
    }

    #[test]
    fn given_failed_write_then_error_is_sticky() {
        let mut writer = Writer::new(
            FailingOutput { attempts: 0 },
            "testAcct",
            AccountType::CCard,
            date_format(),
        );
        let tx = transaction(1, "testPayee", Decimal::new(1026, 2), None);

        let first = writer.write_transaction(&tx).unwrap_err();
        assert_eq!(io::ErrorKind::Other, first.kind());
        assert_eq!(1, writer.out.attempts);

        let second = writer.write_transaction(&tx).unwrap_err();
        assert_eq!(first.to_string(), second.to_string());
        assert!(writer.write_header().is_err());
        assert!(writer.write_transactions([&tx]).is_err());
        assert_eq!(1, writer.out.attempts);

        let finished = writer.finish().err().unwrap();
        assert_eq!(first.to_string(), finished.to_string());
    }
}
