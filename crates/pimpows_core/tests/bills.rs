use chrono::NaiveDate;
use pimpows_core::db::open_db_in_memory;
use pimpows_core::{
    BillListQuery, BillPatch, BillService, BillSort, BillStatusFilter, CategoryKind,
    CategoryService, DateWindow, EntryListQuery, ExpenseService, LedgerError, Money, NewBill,
    PaymentStatus, Recurrence,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// 2024-03-15T12:00:00Z
const MARCH_15_NOON_MS: i64 = 1_710_504_000_000;

#[test]
fn monthly_installments_are_expanded_with_clamped_due_dates() {
    let conn = open_db_in_memory().unwrap();
    let service = BillService::new(&conn);

    let request = NewBill {
        recurrence: Recurrence::Monthly,
        total_installments: Some(3),
        ..NewBill::single("Notebook", day(2024, 1, 31), Some(Money::new(450, 0)))
    };
    let created = service.create_bill(&request).unwrap();

    let due_dates: Vec<_> = created.iter().map(|bill| bill.due_date).collect();
    assert_eq!(
        due_dates,
        vec![day(2024, 1, 31), day(2024, 2, 29), day(2024, 3, 31)]
    );
    let installments: Vec<_> = created
        .iter()
        .map(|bill| (bill.current_installment, bill.total_installments))
        .collect();
    assert_eq!(
        installments,
        vec![(Some(1), Some(3)), (Some(2), Some(3)), (Some(3), Some(3))]
    );
    assert!(created.iter().all(|bill| bill.status == PaymentStatus::Pending));
    assert_eq!(service.all_bills().unwrap().len(), 3);
}

#[test]
fn custom_recurrence_steps_by_recurrence_months() {
    let conn = open_db_in_memory().unwrap();
    let service = BillService::new(&conn);

    let request = NewBill {
        recurrence: Recurrence::Custom,
        recurrence_months: Some(3),
        total_installments: Some(2),
        ..NewBill::single("Condominio extra", day(2024, 1, 10), None)
    };
    let created = service.create_bill(&request).unwrap();
    assert_eq!(created[1].due_date, day(2024, 4, 10));
}

#[test]
fn installment_count_outside_range_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = BillService::new(&conn);

    let request = NewBill {
        recurrence: Recurrence::Monthly,
        total_installments: Some(0),
        ..NewBill::single("Carro", day(2024, 1, 10), None)
    };
    let err = service.create_bill(&request).unwrap_err();
    assert!(matches!(err, LedgerError::InstallmentCount { requested: 0, .. }));
    assert!(service.all_bills().unwrap().is_empty());
}

#[test]
fn bills_reject_income_categories() {
    let conn = open_db_in_memory().unwrap();
    let salary = CategoryService::new(&conn)
        .create_category("Salario", None, CategoryKind::Income)
        .unwrap();

    let mut request = NewBill::single("Luz", day(2024, 2, 10), None);
    request.category_ids = vec![salary.id];
    let err = BillService::new(&conn).create_bill(&request).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::CategoryKindMismatch {
            expected: CategoryKind::Expense,
            actual: CategoryKind::Income,
            ..
        }
    ));

    request.category_ids = vec![uuid::Uuid::new_v4()];
    let err = BillService::new(&conn).create_bill(&request).unwrap_err();
    assert!(matches!(err, LedgerError::CategoryNotFound(_)));
}

#[test]
fn paying_bill_records_linked_expense_with_categories() {
    let conn = open_db_in_memory().unwrap();
    let casa = CategoryService::new(&conn)
        .create_category("Casa", None, CategoryKind::Expense)
        .unwrap();
    let service = BillService::new(&conn);

    let mut request = NewBill::single("Luz", day(2024, 3, 10), Some(Money::new(120, 0)));
    request.category_ids = vec![casa.id];
    let bill = service.create_bill(&request).unwrap().remove(0);

    let payment = service
        .pay_bill(bill.id, Money::new(118, 40), MARCH_15_NOON_MS)
        .unwrap();
    assert_eq!(payment.bill.status, PaymentStatus::Paid);
    assert_eq!(payment.bill.paid_value, Some(Money::new(118, 40)));
    assert_eq!(payment.bill.paid_at, Some(MARCH_15_NOON_MS));

    let expenses = ExpenseService::new(&conn)
        .list_expenses(&EntryListQuery::default())
        .unwrap();
    assert_eq!(expenses.len(), 1);
    let expense = &expenses[0];
    assert_eq!(expense.bill_id, Some(bill.id));
    assert_eq!(expense.date, day(2024, 3, 15));
    assert_eq!(expense.name, "Luz");
    assert_eq!(expense.value, Money::new(118, 40));
    assert_eq!(expense.categories[0].id, casa.id);

    let err = service
        .pay_bill(bill.id, Money::new(1, 0), MARCH_15_NOON_MS)
        .unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyPaid(id) if id == bill.id));
}

#[test]
fn unpaying_bill_removes_its_expense() {
    let conn = open_db_in_memory().unwrap();
    let service = BillService::new(&conn);
    let bill = service
        .create_bill(&NewBill::single("Agua", day(2024, 3, 10), Some(Money::new(80, 0))))
        .unwrap()
        .remove(0);
    service
        .pay_bill(bill.id, Money::new(80, 0), MARCH_15_NOON_MS)
        .unwrap();
    assert_eq!(service.bill_expenses(bill.id).unwrap().len(), 1);

    let reverted = service.unpay_bill(bill.id).unwrap();
    assert_eq!(reverted.status, PaymentStatus::Pending);
    assert_eq!(reverted.paid_value, None);
    assert_eq!(reverted.paid_at, None);

    let expenses = ExpenseService::new(&conn)
        .list_expenses(&EntryListQuery::default())
        .unwrap();
    assert!(expenses.is_empty());
    assert!(service.bill_expenses(bill.id).unwrap().is_empty());

    let err = service.unpay_bill(bill.id).unwrap_err();
    assert!(matches!(err, LedgerError::NotPaid(_)));
}

#[test]
fn deleting_paid_bill_keeps_expense_without_link() {
    let conn = open_db_in_memory().unwrap();
    let service = BillService::new(&conn);
    let bill = service
        .create_bill(&NewBill::single("Gas", day(2024, 3, 1), Some(Money::new(95, 0))))
        .unwrap()
        .remove(0);
    let payment = service
        .pay_bill(bill.id, Money::new(95, 0), MARCH_15_NOON_MS)
        .unwrap();

    service.delete_bill(bill.id).unwrap();

    let expense = ExpenseService::new(&conn)
        .get_expense(payment.expense.id)
        .unwrap()
        .unwrap();
    assert_eq!(expense.bill_id, None);
    assert!(service.get_bill(bill.id).unwrap().is_none());
}

#[test]
fn update_patches_fields_and_replaces_categories_only_when_given() {
    let conn = open_db_in_memory().unwrap();
    let categories = CategoryService::new(&conn);
    let casa = categories
        .create_category("Casa", None, CategoryKind::Expense)
        .unwrap();
    let carro = categories
        .create_category("Carro", None, CategoryKind::Expense)
        .unwrap();
    let service = BillService::new(&conn);

    let mut request = NewBill::single("IPTU", day(2024, 2, 20), None);
    request.category_ids = vec![casa.id];
    let bill = service.create_bill(&request).unwrap().remove(0);

    let patched = service
        .update_bill(
            bill.id,
            &BillPatch {
                value: Some(Some(Money::new(900, 0))),
                observation: Some(Some("cota unica".to_string())),
                ..BillPatch::default()
            },
        )
        .unwrap();
    assert_eq!(patched.value, Some(Money::new(900, 0)));
    assert_eq!(patched.categories.len(), 1);

    let retagged = service
        .update_bill(
            bill.id,
            &BillPatch {
                category_ids: Some(vec![carro.id]),
                ..BillPatch::default()
            },
        )
        .unwrap();
    let stored = service.get_bill(bill.id).unwrap().unwrap();
    assert_eq!(stored, retagged);
    assert_eq!(stored.categories[0].id, carro.id);
    assert_eq!(stored.observation.as_deref(), Some("cota unica"));
}

#[test]
fn list_filters_by_search_category_status_and_sorts_by_value() {
    let conn = open_db_in_memory().unwrap();
    let casa = CategoryService::new(&conn)
        .create_category("Casa", None, CategoryKind::Expense)
        .unwrap();
    let service = BillService::new(&conn);

    let mut luz = NewBill::single("Conta de Luz", day(2024, 3, 5), Some(Money::new(150, 0)));
    luz.category_ids = vec![casa.id];
    service.create_bill(&luz).unwrap();
    service
        .create_bill(&NewBill::single("Internet", day(2024, 3, 20), Some(Money::new(99, 90))))
        .unwrap();
    service
        .create_bill(&NewBill::single("Seguro", day(2024, 3, 25), None))
        .unwrap();

    let today = day(2024, 3, 10);
    let mut query = BillListQuery::new(today);
    query.search = Some("LUZ".to_string());
    assert_eq!(service.list_bills(&query).unwrap().len(), 1);

    let mut query = BillListQuery::new(today);
    query.category = Some(casa.id);
    let tagged = service.list_bills(&query).unwrap();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].name, "Conta de Luz");

    let mut query = BillListQuery::new(today);
    query.status = BillStatusFilter::Overdue;
    let overdue = service.list_bills(&query).unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].name, "Conta de Luz");

    let mut query = BillListQuery::new(today);
    query.sort = BillSort::ValueDesc;
    let names: Vec<_> = service
        .list_bills(&query)
        .unwrap()
        .into_iter()
        .map(|bill| bill.name)
        .collect();
    assert_eq!(names, vec!["Conta de Luz", "Internet", "Seguro"]);
}

#[test]
fn expense_window_sees_bill_payment_date() {
    let conn = open_db_in_memory().unwrap();
    let service = BillService::new(&conn);
    let bill = service
        .create_bill(&NewBill::single("Luz", day(2024, 2, 28), Some(Money::new(10, 0))))
        .unwrap()
        .remove(0);
    service
        .pay_bill(bill.id, Money::new(10, 0), MARCH_15_NOON_MS)
        .unwrap();

    let query = EntryListQuery {
        window: DateWindow::between(day(2024, 2, 1), day(2024, 2, 29)),
        ..EntryListQuery::default()
    };
    let february = ExpenseService::new(&conn).list_expenses(&query).unwrap();
    assert!(february.is_empty());
}
