use crate::commands::{
    BackupCommand, BillCommand, CategoryCommand, Command, EntryListArgs, ExpenseCommand,
    IncomeCommand, LoanCommand, PredictionCommand,
};
use crate::render;
use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use pimpows_core::{
    annual_series, dashboard_bill_groups, default_backup_file_name, export_backup,
    monthly_summary, now_epoch_ms, parse_backup_json, restore_backup, write_backup_json,
    BillListQuery, BillPatch, BillService, CategoryService, Connection, DateWindow,
    EntryListQuery, ExpensePatch, ExpenseService, IncomePatch, IncomeService, LoanPatch,
    LoanService, MonthRange, NewBill, NewExpense, NewIncome, NewLoan, NewPrediction,
    PredictionPatch, PredictionService,
};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;

pub(crate) fn dispatch(conn: &Connection, command: Command, today: NaiveDate) -> Result<()> {
    match command {
        Command::Category(command) => category(conn, command),
        Command::Bill(command) => bill(conn, command, today),
        Command::Income(command) => income(conn, command, today),
        Command::Expense(command) => expense(conn, command, today),
        Command::Prediction(command) => prediction(conn, command, today),
        Command::Loan(command) => loan(conn, command, today),
        Command::Summary { month, categories } => {
            let filter: HashSet<_> = categories.into_iter().collect();
            let month = MonthRange::containing(month.unwrap_or(today));
            let bills = BillService::new(conn).all_bills()?;
            let everything = EntryListQuery::default();
            let income = IncomeService::new(conn).list_income(&everything)?;
            let expenses = ExpenseService::new(conn).list_expenses(&everything)?;
            let summary = monthly_summary(&bills, &income, &expenses, month, &filter);
            render::summary(&summary);
            Ok(())
        }
        Command::Dashboard => {
            let bills = BillService::new(conn).all_bills()?;
            render::dashboard(&dashboard_bill_groups(&bills, today), today);
            Ok(())
        }
        Command::Annual { categories } => {
            let filter: HashSet<_> = categories.into_iter().collect();
            let bills = BillService::new(conn).all_bills()?;
            let everything = EntryListQuery::default();
            let income = IncomeService::new(conn).list_income(&everything)?;
            let expenses = ExpenseService::new(conn).list_expenses(&everything)?;
            render::annual(&annual_series(&bills, &income, &expenses, today, &filter));
            Ok(())
        }
        Command::Backup(command) => backup(conn, command, today),
        Command::Version => Ok(()),
    }
}

fn category(conn: &Connection, command: CategoryCommand) -> Result<()> {
    let service = CategoryService::new(conn);
    match command {
        CategoryCommand::Add { name, kind, color } => {
            let category = service.create_category(&name, color.as_deref(), kind.into())?;
            println!("created category {}", category.id);
        }
        CategoryCommand::List { kind } => {
            for category in service.list_categories(kind.map(Into::into))? {
                render::category(&category);
            }
        }
        CategoryCommand::Edit { id, name, color } => {
            let category = service.update_category(id, name.as_deref(), color.as_deref())?;
            render::category(&category);
        }
        CategoryCommand::Rm { id } => {
            service.delete_category(id)?;
            println!("deleted category {id}");
        }
    }
    Ok(())
}

fn bill(conn: &Connection, command: BillCommand, today: NaiveDate) -> Result<()> {
    let service = BillService::new(conn);
    match command {
        BillCommand::Add {
            name,
            due,
            value,
            recurrence,
            every,
            installments,
            observation,
            categories,
        } => {
            let created = service.create_bill(&NewBill {
                name,
                due_date: due,
                value,
                recurrence: recurrence.into(),
                recurrence_months: every,
                total_installments: installments,
                observation,
                category_ids: categories,
            })?;
            println!("created {} bill(s)", created.len());
            for bill in &created {
                render::bill(bill, today);
            }
        }
        BillCommand::List {
            search,
            category,
            status,
            sort,
        } => {
            let query = BillListQuery {
                search,
                category,
                status: status.into(),
                sort: sort.into(),
                today,
            };
            for bill in service.list_bills(&query)? {
                render::bill(&bill, today);
            }
        }
        BillCommand::Edit {
            id,
            name,
            due,
            value,
            observation,
            categories,
        } => {
            let patch = BillPatch {
                name,
                due_date: due,
                value: value.map(Some),
                observation: observation.map(|text| Some(text).filter(|t| !t.is_empty())),
                category_ids: categories,
            };
            render::bill(&service.update_bill(id, &patch)?, today);
        }
        BillCommand::Pay { id, value, on } => {
            let bill = service
                .get_bill(id)?
                .with_context(|| format!("bill not found: {id}"))?;
            let Some(paid_value) = value.or(bill.value) else {
                bail!("bill {id} has no value; pass --value");
            };
            let payment = service.pay_bill(id, paid_value, paid_at_ms(on, today))?;
            println!(
                "paid bill {} with {} (expense {})",
                payment.bill.id,
                paid_value.format_brl(),
                payment.expense.id
            );
        }
        BillCommand::Unpay { id } => {
            render::bill(&service.unpay_bill(id)?, today);
        }
        BillCommand::Rm { id } => {
            service.delete_bill(id)?;
            println!("deleted bill {id}");
        }
    }
    Ok(())
}

fn income(conn: &Connection, command: IncomeCommand, today: NaiveDate) -> Result<()> {
    let service = IncomeService::new(conn);
    match command {
        IncomeCommand::Add {
            origin,
            value,
            date,
            account,
            categories,
        } => {
            let entry = service.create_income(&NewIncome {
                date: date.unwrap_or(today),
                origin,
                account,
                value,
                category_ids: categories,
            })?;
            println!("created income {}", entry.id);
        }
        IncomeCommand::List(args) => {
            let entries = service.list_income(&entry_query(args))?;
            for entry in &entries {
                render::income(entry);
            }
            render::total(entries.iter().map(|entry| entry.value).sum());
        }
        IncomeCommand::Edit {
            id,
            origin,
            value,
            date,
            account,
            categories,
        } => {
            let patch = IncomePatch {
                date,
                origin,
                account: account.map(|text| Some(text).filter(|t| !t.is_empty())),
                value,
                category_ids: categories,
            };
            render::income(&service.update_income(id, &patch)?);
        }
        IncomeCommand::Rm { id } => {
            service.delete_income(id)?;
            println!("deleted income {id}");
        }
    }
    Ok(())
}

fn expense(conn: &Connection, command: ExpenseCommand, today: NaiveDate) -> Result<()> {
    let service = ExpenseService::new(conn);
    match command {
        ExpenseCommand::Add {
            name,
            value,
            date,
            categories,
        } => {
            let entry = service.create_expense(&NewExpense {
                date: date.unwrap_or(today),
                name,
                value,
                category_ids: categories,
            })?;
            println!("created expense {}", entry.id);
        }
        ExpenseCommand::List(args) => {
            let entries = service.list_expenses(&entry_query(args))?;
            for entry in &entries {
                render::expense(entry);
            }
            render::total(entries.iter().map(|entry| entry.value).sum());
        }
        ExpenseCommand::Edit {
            id,
            name,
            value,
            date,
            categories,
        } => {
            let patch = ExpensePatch {
                date,
                name,
                value,
                category_ids: categories,
            };
            render::expense(&service.update_expense(id, &patch)?);
        }
        ExpenseCommand::Rm { id } => {
            service.delete_expense(id)?;
            println!("deleted expense {id}");
        }
    }
    Ok(())
}

fn prediction(conn: &Connection, command: PredictionCommand, today: NaiveDate) -> Result<()> {
    let service = PredictionService::new(conn);
    match command {
        PredictionCommand::Add {
            origin,
            value,
            date,
            categories,
        } => {
            let prediction = service.create_prediction(&NewPrediction {
                date,
                origin,
                value,
                category_ids: categories,
            })?;
            println!("created prediction {}", prediction.id);
        }
        PredictionCommand::List(args) => {
            render::prediction_board(&service.prediction_board(&entry_query(args))?);
        }
        PredictionCommand::Edit {
            id,
            origin,
            value,
            date,
            categories,
        } => {
            let patch = PredictionPatch {
                date,
                origin,
                value,
                category_ids: categories,
            };
            render::prediction(&service.update_prediction(id, &patch)?);
        }
        PredictionCommand::Paid { id, on, undo } => {
            let prediction = if undo {
                service.unmark_prediction_paid(id)?
            } else {
                service.mark_prediction_paid(id, paid_at_ms(on, today))?
            };
            render::prediction(&prediction);
        }
        PredictionCommand::Rm { id } => {
            service.delete_prediction(id)?;
            println!("deleted prediction {id}");
        }
    }
    Ok(())
}

fn loan(conn: &Connection, command: LoanCommand, today: NaiveDate) -> Result<()> {
    let service = LoanService::new(conn);
    match command {
        LoanCommand::Add {
            name,
            due,
            value,
            observation,
        } => {
            let loan = service.create_loan(&NewLoan {
                name,
                due_date: due,
                installment_value: value,
                observation,
            })?;
            println!("created loan {}", loan.id);
        }
        LoanCommand::List { search } => {
            render::loan_board(&service.loan_board(search.as_deref())?);
        }
        LoanCommand::Edit {
            id,
            name,
            due,
            value,
            observation,
        } => {
            let patch = LoanPatch {
                name,
                due_date: due,
                installment_value: value,
                observation: observation.map(|text| Some(text).filter(|t| !t.is_empty())),
            };
            render::loan(&service.update_loan(id, &patch)?);
        }
        LoanCommand::Pay { id, on } => {
            render::loan(&service.pay_loan(id, paid_at_ms(on, today))?);
        }
        LoanCommand::Unpay { id } => {
            render::loan(&service.unpay_loan(id)?);
        }
        LoanCommand::Rm { id } => {
            service.delete_loan(id)?;
            println!("deleted loan {id}");
        }
    }
    Ok(())
}

fn backup(conn: &Connection, command: BackupCommand, today: NaiveDate) -> Result<()> {
    match command {
        BackupCommand::Export { out } => {
            let path = out.unwrap_or_else(|| default_backup_file_name(today).into());
            let document = export_backup(conn, Utc::now())?;
            let file = File::create(&path)
                .with_context(|| format!("failed to create `{}`", path.display()))?;
            write_backup_json(&document, BufWriter::new(file))?;
            println!("backup written to {}", path.display());
        }
        BackupCommand::Restore { path } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read `{}`", path.display()))?;
            let document = parse_backup_json(&text)?;
            let report = restore_backup(conn, &document)?;
            println!(
                "restored {} categories, {} bills, {} income, {} expenses, {} predictions, {} loans",
                report.categories,
                report.bills,
                report.income_entries,
                report.expense_entries,
                report.income_predictions,
                report.loans
            );
        }
    }
    Ok(())
}

fn entry_query(args: EntryListArgs) -> EntryListQuery {
    EntryListQuery {
        window: DateWindow {
            from: args.from,
            to: args.to,
        },
        categories: args.categories.into_iter().collect(),
        search: args.search,
        sort: args.sort.into(),
    }
}

/// Payment timestamp: noon UTC of `on`, or of the reference day.
fn paid_at_ms(on: Option<NaiveDate>, today: NaiveDate) -> i64 {
    on.unwrap_or(today)
        .and_hms_opt(12, 0, 0)
        .map(|moment| moment.and_utc().timestamp_millis())
        .unwrap_or_else(now_epoch_ms)
}

#[cfg(test)]
mod tests {
    use super::paid_at_ms;
    use chrono::NaiveDate;

    #[test]
    fn payment_defaults_to_reference_day_at_noon_utc() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(paid_at_ms(None, today), 1_710_504_000_000);

        let on = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let stamped = paid_at_ms(Some(on), today);
        assert_eq!(pimpows_core::model::epoch_ms_to_date(stamped), Some(on));
    }
}
