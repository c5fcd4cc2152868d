use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::replay::Command;
use crate::{Amount, Call, ParticipantId, Transaction, TxId};

/// Errors that can occur when reading or writing csv files
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open call log: {0}")]
    Open(csv::Error),

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized operation '{op}'")]
    UnrecognizedOp { line: usize, op: String },

    #[error("line {line}: {op} missing argument {position}")]
    MissingArgument {
        line: usize,
        op: String,
        position: usize,
    },

    #[error("line {line}: {op} has invalid argument '{value}'")]
    InvalidArgument {
        line: usize,
        op: String,
        value: String,
    },

    #[error("failed to write output: {0}")]
    Write(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct InputRow {
    caller: ParticipantId,
    op: String,
    arg1: Option<String>,
    arg2: Option<String>,
    arg3: Option<String>,
    arg4: Option<String>,
}

#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    tx: TxId,
    company: ParticipantId,
    picker: ParticipantId,
    weight: u64,
    price: u64,
    state: &'a str,
}

/// Positional arguments of one row, with the context needed for errors.
struct Args {
    line: usize,
    op: String,
    values: [Option<String>; 4],
}

impl Args {
    fn text(&mut self, position: usize) -> Result<String, CsvError> {
        self.values[position - 1]
            .take()
            .ok_or_else(|| CsvError::MissingArgument {
                line: self.line,
                op: self.op.clone(),
                position,
            })
    }

    fn parse<T: FromStr>(&mut self, position: usize) -> Result<T, CsvError> {
        let value = self.text(position)?;
        value.parse().map_err(|_| CsvError::InvalidArgument {
            line: self.line,
            op: self.op.clone(),
            value,
        })
    }

    fn amount(&mut self, position: usize) -> Result<Amount, CsvError> {
        self.parse::<u128>(position).map(Amount::new)
    }
}

/// Read a call log from a csv file.
///
/// Expected header: `caller,op,arg1,arg2,arg3,arg4`. Unused trailing
/// arguments may be left empty.
pub fn read_commands(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Command, CsvError>>, CsvError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(CsvError::Open)?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            parse_row(line, row)
        }))
}

fn parse_row(line: usize, row: InputRow) -> Result<Command, CsvError> {
    let caller = row.caller;
    let mut args = Args {
        line,
        op: row.op,
        values: [row.arg1, row.arg2, row.arg3, row.arg4],
    };

    let call = match args.op.as_str() {
        "register_company" => Call::RegisterCompany {
            name: args.text(1)?,
            min_weight: args.parse(2)?,
            max_price: args.parse(3)?,
            active: args.parse(4)?,
        },
        "edit_company" => Call::EditCompany {
            name: args.text(1)?,
            min_weight: args.parse(2)?,
            max_price: args.parse(3)?,
            active: args.parse(4)?,
        },
        "set_company_name" => Call::SetCompanyName {
            name: args.text(1)?,
        },
        "set_company_min_weight" => Call::SetCompanyMinWeight {
            min_weight: args.parse(1)?,
        },
        "set_company_max_price" => Call::SetCompanyMaxPrice {
            max_price: args.parse(1)?,
        },
        "set_company_active" => Call::SetCompanyActive {
            active: args.parse(1)?,
        },
        "register_picker" => Call::RegisterPicker {
            name: args.text(1)?,
            email: args.text(2)?,
        },
        "edit_picker" => Call::EditPicker {
            name: args.text(1)?,
            email: args.text(2)?,
        },
        "set_picker_name" => Call::SetPickerName {
            name: args.text(1)?,
        },
        "set_picker_email" => Call::SetPickerEmail {
            email: args.text(1)?,
        },
        "deposit" => Call::Deposit {
            company: args.parse(1)?,
            weight: args.parse(2)?,
        },
        "validate" => Call::Validate { tx: args.parse(1)? },
        "settle" => Call::Settle { tx: args.parse(1)? },
        "mint" => {
            return Ok(Command::Mint {
                to: caller,
                amount: args.amount(1)?,
            });
        }
        "approve" => {
            return Ok(Command::Approve {
                owner: caller,
                amount: args.amount(1)?,
            });
        }
        _ => {
            return Err(CsvError::UnrecognizedOp {
                line,
                op: args.op,
            });
        }
    };
    Ok(Command::Call { caller, call })
}

/// Write the transaction table in csv format
pub fn write_transactions<'a, W: io::Write>(
    writer: W,
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(writer);

    for tx in transactions {
        writer.serialize(OutputRow {
            tx: tx.id,
            company: tx.company,
            picker: tx.picker,
            weight: tx.weight,
            price: tx.price,
            state: tx.state.as_str(),
        })?;
    }

    writer.flush().map_err(|e| CsvError::Write(e.into()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TxState;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "caller,op,arg1,arg2,arg3,arg4\n";

    fn write_csv(rows: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(HEADER.as_bytes()).unwrap();
        file.write_all(rows.as_bytes()).unwrap();
        file
    }

    fn read(rows: &str) -> Vec<Result<Command, CsvError>> {
        let file = write_csv(rows);
        read_commands(file.path()).unwrap().collect()
    }

    #[test]
    fn read_register_company() {
        let results = read("10,register_company,Acme,100,10,true\n");
        assert_eq!(results.len(), 1);

        match results.into_iter().next().unwrap().unwrap() {
            Command::Call { caller, call } => {
                assert_eq!(caller, 10);
                assert_eq!(
                    call,
                    Call::RegisterCompany {
                        name: "Acme".into(),
                        min_weight: 100,
                        max_price: 10,
                        active: true,
                    }
                );
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn read_deposit_with_empty_trailing_args() {
        let results = read("20,deposit,10,150,,\n");
        match results.into_iter().next().unwrap().unwrap() {
            Command::Call { caller, call } => {
                assert_eq!(caller, 20);
                assert_eq!(
                    call,
                    Call::Deposit {
                        company: 10,
                        weight: 150
                    }
                );
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn read_ledger_commands() {
        let results = read("10,mint,2000,,,\n10,approve,1500,,,\n");
        assert!(matches!(
            results[0],
            Ok(Command::Mint { to: 10, amount }) if amount == Amount::new(2_000)
        ));
        assert!(matches!(
            results[1],
            Ok(Command::Approve { owner: 10, amount }) if amount == Amount::new(1_500)
        ));
    }

    #[test]
    fn read_with_whitespace() {
        let results = read("20, register_picker, Ana, ana@example.org, ,\n");
        assert!(matches!(
            &results[0],
            Ok(Command::Call { call: Call::RegisterPicker { name, .. }, .. }) if name == "Ana"
        ));
    }

    #[test]
    fn read_returns_error_for_unknown_op() {
        let results = read("1,withdraw,5,,,\n");
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(err, CsvError::UnrecognizedOp { line: 2, .. }));
    }

    #[test]
    fn read_returns_error_for_missing_argument() {
        let results = read("1,validate,,,,\n");
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(
            err,
            CsvError::MissingArgument {
                line: 2,
                position: 1,
                ..
            }
        ));
    }

    #[test]
    fn read_returns_error_for_invalid_argument() {
        let results = read("1,set_company_active,maybe,,,\n");
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(err, CsvError::InvalidArgument { line: 2, .. }));
    }

    #[test]
    fn read_missing_file_fails() {
        assert!(matches!(
            read_commands("does/not/exist.csv"),
            Err(CsvError::Open(_))
        ));
    }

    #[test]
    fn write_transaction_table() {
        let mut settled = Transaction::new(1, 10, 21, 200, 10);
        settled.state = TxState::Settled;
        let txs = [Transaction::new(0, 10, 20, 150, 10), settled];

        let mut out = Vec::new();
        write_transactions(&mut out, &txs).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "tx,company,picker,weight,price,state");
        assert_eq!(lines[1], "0,10,20,150,10,pending");
        assert_eq!(lines[2], "1,10,21,200,10,settled");
    }
}
