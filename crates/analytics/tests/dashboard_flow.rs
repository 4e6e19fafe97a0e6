//! Integration test for a full dashboard build over a realistic snapshot.

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use facility_analytics::{AnalyticsDashboard, ForecastPeriod, ReportKind, ReportWindow};
    use facility_core::dates::DateRange;
    use facility_core::snapshot::{parse_collection, DataSnapshot};

    /// Construct a small but complete snapshot as the backend would return it.
    fn sample_snapshot() -> DataSnapshot {
        let bookings = parse_collection(
            "bookings",
            r#"[
                {"id": "b1", "customer_id": "c1", "service_id": "s1", "assigned_provider_id": "p1",
                 "scheduled_date": "2025-01-10", "status": "completed", "payment_status": "paid",
                 "total_amount": 100, "started_at": "2025-01-10T09:00:00Z",
                 "completed_at": "2025-01-10T11:00:00Z",
                 "created_date": "2025-01-02T08:00:00.000000"},
                {"id": "b2", "customer_id": "c2", "service_id": "s2", "assigned_provider_id": "p1",
                 "scheduled_date": "2025-02-10", "status": "completed", "payment_status": "paid",
                 "total_amount": 200, "started_at": "2025-02-10T09:00:00Z",
                 "completed_at": "2025-02-10T10:00:00Z",
                 "created_date": "2025-02-01T08:00:00.000000"},
                {"id": "b3", "customer_id": "c1", "service_id": "s1", "assigned_provider_id": "p2",
                 "scheduled_date": "2025-02-20", "status": "confirmed", "payment_status": "pending",
                 "total_amount": 150, "created_date": "2025-02-15T08:00:00.000000"},
                {"id": "b4", "customer_id": "c3", "scheduled_date": null, "status": "pending",
                 "payment_status": "paid", "total_amount": 75}
            ]"#,
        )
        .unwrap();

        let subscriptions = parse_collection(
            "subscriptions",
            r#"[
                {"id": "sub1", "customer_id": "c1", "package_id": "pk1", "status": "active",
                 "monthly_amount": 50, "start_date": "2024-12-01", "auto_renew": true},
                {"id": "sub2", "customer_id": "c2", "package_id": "pk1", "status": "cancelled",
                 "monthly_amount": 40, "start_date": "2025-01-05", "end_date": "2025-02-15",
                 "cancelled_at": "2025-02-15T12:00:00Z", "cancel_reason": "Too expensive"}
            ]"#,
        )
        .unwrap();

        let providers = parse_collection(
            "providers",
            r#"[
                {"id": "p1", "full_name": "Ana Ruiz", "is_active": true, "average_rating": 4.8,
                 "specialization": ["cleaning"]},
                {"id": "p2", "full_name": "Sam Lee", "is_active": true},
                {"id": "p3", "full_name": "Retired Tech", "is_active": false}
            ]"#,
        )
        .unwrap();

        let services = parse_collection(
            "services",
            r#"[
                {"id": "s1", "name": "Deep clean", "duration_minutes": 120, "category_id": "cat1"},
                {"id": "s2", "name": "AC service", "duration_minutes": 90}
            ]"#,
        )
        .unwrap();

        let reviews = parse_collection(
            "reviews",
            r#"[{"provider_id": "p1", "rating": 5}, {"provider_id": "p2", "rating": 3}]"#,
        )
        .unwrap();

        DataSnapshot {
            bookings,
            subscriptions,
            providers,
            services,
            reviews,
        }
    }

    fn window() -> ReportWindow {
        ReportWindow {
            range: DateRange::parse("2025-01-01", "2025-02-28").unwrap(),
            today: NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(),
            period: ForecastPeriod::Monthly,
        }
    }

    #[test]
    fn test_full_dashboard_build() {
        let snapshot = sample_snapshot();
        let report = AnalyticsDashboard::default().build(&snapshot, &window());

        // On-demand revenue: the two paid, dated bookings.
        let months: Vec<&str> = report.revenue.points.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(months, vec!["Jan 25", "Feb 25"]);
        assert!((report.revenue.points[0].on_demand_revenue - 100.0).abs() < 1e-9);
        assert!((report.revenue.points[1].on_demand_revenue - 200.0).abs() < 1e-9);
        assert!((report.revenue.on_demand_total - 300.0).abs() < 1e-9);
        // sub1 runs both months, sub2 both months (Jan 5 to Feb 15).
        assert!((report.revenue.subscription_total - 180.0).abs() < 1e-9);

        assert_eq!(report.churn.summary.total_cancelled, 1);
        assert_eq!(report.churn.top_reasons[0].reason, "too expensive");

        assert_eq!(report.utilization.chart_data.len(), 2);
        assert_eq!(report.utilization.summary.as_ref().unwrap().technicians, 2);

        assert_eq!(report.completion_time.overall.count, 2);
        assert_eq!(report.ratings[0].provider_id, "p1");
        assert_eq!(report.forecast.history.len(), 2);
        assert_eq!(report.forecast.staffing.active_technicians, 2);
    }

    #[test]
    fn test_dashboard_is_idempotent() {
        let snapshot = sample_snapshot();
        let dashboard = AnalyticsDashboard::default();
        let first = dashboard.build(&snapshot, &window());
        let second = dashboard.build(&snapshot, &window());
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_every_named_report_serializes() {
        let snapshot = sample_snapshot();
        let dashboard = AnalyticsDashboard::default();
        for kind in ReportKind::ALL {
            let value = dashboard.report(kind, &snapshot, &window()).unwrap();
            assert!(!value.is_null(), "{kind} produced null");
        }
    }

    #[test]
    fn test_inverted_range_yields_empty_series() {
        let snapshot = sample_snapshot();
        let window = ReportWindow {
            range: DateRange::parse("2025-03-01", "2025-01-01").unwrap(),
            ..window()
        };
        let report = AnalyticsDashboard::default().build(&snapshot, &window);
        assert!(report.revenue.points.is_empty());
        assert!(report.churn.monthly.is_empty());
        assert!(report.subscription_growth.is_empty());
        assert!(report.acquisition.monthly.is_empty());
    }
}
