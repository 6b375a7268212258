use chrono::{Local, NaiveDate};
use clap::Args;
use property_ledger::error::AppError;
use property_ledger::portfolio::{
    build_schedule, Dashboard, InMemoryDocumentStore, InMemoryPortfolioStore, IncomeSummary,
    NotificationRuleRequest, OccupancyRequest, PortfolioError, PortfolioPolicy, PortfolioService,
    PropertyRequest, SignupRequest, MAX_PAYMENTS,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reporting date for dashboards and reminders (defaults to today).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the payment ledger of the sample tenancy as CSV.
    #[arg(long)]
    pub(crate) csv: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ScheduleArgs {
    /// Total rent for the whole lease
    #[arg(long)]
    pub(crate) total_rent: f64,
    /// Lease start date (YYYY-MM-DD); the first installment is due that day
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: NaiveDate,
    /// Number of installments
    #[arg(long)]
    pub(crate) payments: u32,
}

pub(crate) fn run_schedule_preview(args: ScheduleArgs) -> Result<(), AppError> {
    let ScheduleArgs {
        total_rent,
        start,
        payments,
    } = args;

    if !(total_rent.is_finite() && total_rent > 0.0) {
        return Err(rejected("Total rent must be greater than 0"));
    }
    if payments == 0 {
        return Err(rejected("Number of payments must be greater than 0"));
    }
    if payments > MAX_PAYMENTS {
        return Err(rejected(&format!(
            "Number of payments cannot exceed {MAX_PAYMENTS}"
        )));
    }
    let schedule = build_schedule(total_rent, start, payments, &[]).ok_or_else(|| {
        rejected("Payment schedule falls outside the supported date range")
    })?;

    println!(
        "Installment schedule: {:.2} over {} payments from {}",
        total_rent, payments, start
    );
    for (index, payment) in schedule.iter().enumerate() {
        println!(
            "  {:>3}. {}  {:>10.2}  {}",
            index + 1,
            payment.due_date,
            payment.amount,
            payment.status.label()
        );
    }
    Ok(())
}

fn rejected(reason: &str) -> AppError {
    AppError::Portfolio(PortfolioError::Validation(reason.to_string()))
}

/// Builds a throwaway portfolio in memory and prints what the API would
/// report for it.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { today, csv } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let service = PortfolioService::new(
        Arc::new(InMemoryPortfolioStore::new()),
        Arc::new(InMemoryDocumentStore::default()),
        PortfolioPolicy::default(),
    );

    println!("Property ledger demo (as of {today})");
    let owner = service
        .register(SignupRequest {
            full_name: Some("Morgan Hale".to_string()),
            email: Some("morgan@example.com".to_string()),
            password: Some("demo-passphrase".to_string()),
            phone_number: Some("555-0142".to_string()),
        })?
        .owner_id;

    let occupied = service.add_property(owner, sample_property("41 Harbor Road", 1_450.0))?;
    let vacant = service.add_property(owner, sample_property("9 Mill Lane", 1_150.0))?;
    println!(
        "- Registered {} and {} for owner {}",
        occupied.address(),
        vacant.address(),
        owner.0
    );

    let lease_start = today
        .checked_sub_signed(chrono::Duration::days(75))
        .unwrap_or(today);
    let lease_end = lease_start
        .checked_add_signed(chrono::Duration::days(364))
        .unwrap_or(lease_start);
    let created = service.create_occupancy(
        owner,
        &occupied.property_id,
        OccupancyRequest {
            tenant_name: Some("Riley Chen".to_string()),
            tenant_phone: Some("555-0177".to_string()),
            tenant_email: Some("riley@example.com".to_string()),
            lease_start_date: Some(lease_start.to_string()),
            lease_end_date: Some(lease_end.to_string()),
            total_rent: Some(17_400.0),
            number_of_payments: Some(12),
            payments: Vec::new(),
        },
        lease_start,
    )?;
    println!(
        "- Riley Chen moved into {} with {} installments",
        occupied.street_name,
        created.schedule.len()
    );

    if let Some(first) = created.schedule.first() {
        service.set_payment_status(owner, created.occupancy_id, first.payment_id, "paid")?;
        println!("  Marked the {} installment as paid", first.due_date);
    }

    service.save_notification_rule(
        owner,
        &occupied.property_id,
        NotificationRuleRequest {
            notification_type: Some("payment".to_string()),
            notification_period: Some(30),
        },
    )?;

    let income = service.income_summary(owner, &occupied.property_id, today)?;
    render_income(&occupied.street_name, &income);

    let dashboard = service.dashboard(owner, today)?;
    render_dashboard(&dashboard);

    let digest = service.evaluate_notifications(owner, today)?;
    if digest.is_empty() {
        println!("\nReminders: none due within their windows");
    } else {
        println!("\nReminders:");
        for alert in &digest.payment_dues {
            println!(
                "  - {} installment of {:.2} due {} ({} days)",
                alert.street_name, alert.amount, alert.due_date, alert.days_until_due
            );
        }
        for alert in &digest.lease_renewals {
            println!(
                "  - {} lease ends {} ({} days)",
                alert.street_name, alert.lease_end_date, alert.days_remaining
            );
        }
    }

    let overview = service.occupants_overview(owner, today)?;
    println!(
        "\nOccupants: {} total | {} active | {} pending | {} inactive",
        overview.total_occupants,
        overview.active_occupants,
        overview.pending_occupants,
        overview.inactive_occupants
    );

    if csv {
        println!("\nPayment ledger:");
        print!(
            "{}",
            service.export_payments_csv(owner, created.occupancy_id)?
        );
    }

    Ok(())
}

fn sample_property(street: &str, rent: f64) -> PropertyRequest {
    PropertyRequest {
        property_type: Some("apartment".to_string()),
        street_name: Some(street.to_string()),
        city: Some("Portsmouth".to_string()),
        building_details: None,
        size_sqft: Some(780.0),
        bedrooms: Some(2),
        units: Some(1),
        rent_per_month: Some(rent),
    }
}

fn render_income(street: &str, income: &IncomeSummary) {
    println!("\nIncome for {street}");
    println!(
        "- {:.2} of {:.2} collected ({:.1}%)",
        income.total_paid, income.total_rent, income.payment_percentage
    );
    println!(
        "- {:.2} outstanding, {:.2} overdue across {} installments",
        income.total_due,
        income.overdue_amount,
        income.overdue_payments.len()
    );
}

fn render_dashboard(dashboard: &Dashboard) {
    let stats = &dashboard.property_stats;
    let money = &dashboard.financial_stats;
    println!("\nDashboard");
    println!(
        "- {} properties | {} occupied | {} vacant | {:.1}% occupancy",
        stats.total, stats.occupied, stats.vacant, stats.occupancy_rate
    );
    println!(
        "- collected {:.2} | pending {:.2} | expected monthly {:.2} | {:.1}% collection",
        money.total_collected, money.total_pending, money.total_expected, money.collection_rate
    );
    if !dashboard.overdue_payments.is_empty() {
        println!("Overdue:");
        for overdue in &dashboard.overdue_payments {
            println!(
                "  - {} / {}: {:.2} due {} ({} days late)",
                overdue.property,
                overdue.tenant,
                overdue.amount,
                overdue.due_date,
                overdue.days_overdue
            );
        }
    }
    if !dashboard.upcoming_expirations.is_empty() {
        println!("Leases ending soon:");
        for expiring in &dashboard.upcoming_expirations {
            println!(
                "  - {} / {}: {} ({} days)",
                expiring.property, expiring.tenant, expiring.expiry_date, expiring.days_remaining
            );
        }
    }
}
