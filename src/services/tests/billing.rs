// 充值与财务测试

use chrono::{TimeZone, Utc};

use super::{create_user, seeded};
use crate::db::entities::{account_log::AccountChangeType, order::PayStatus};
use crate::db::UserRepository;
use crate::errors::PlatformError;
use crate::services::finance::AccountLogQuery;
use crate::services::recharge::{
    generate_order_no, CreateOrderRequest, OrderQuery, RechargeRuleRequest, ORDER_NO_PREFIX,
};
use crate::services::{FinanceService, RechargeService};
use agentdock_common::PaginationParams;

fn rule_request(label: &str, power: i64, given_power: i64, sell_price: i64) -> RechargeRuleRequest {
    RechargeRuleRequest {
        label: label.to_string(),
        power,
        given_power,
        sell_price,
        sort: 0,
        is_active: true,
    }
}

fn order_for(rule_id: uuid::Uuid) -> CreateOrderRequest {
    CreateOrderRequest {
        rule_id,
        pay_type: None,
    }
}

#[test]
fn test_order_no_format() {
    let now = Utc.with_ymd_and_hms(2024, 3, 5, 8, 9, 10).unwrap();
    let order_no = generate_order_no(now);

    assert!(order_no.starts_with(ORDER_NO_PREFIX));
    assert_eq!(&order_no[2..16], "20240305080910");
    assert_eq!(order_no.len(), 2 + 14 + 6);
    assert!(order_no[16..].chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn test_rules_listing_hides_inactive_and_deleted() {
    let (db, _config) = seeded().await;
    let service = RechargeService::new(db);

    let basic = service.create_rule(rule_request("基础", 100, 0, 990)).await.unwrap();
    let hidden = service
        .create_rule(RechargeRuleRequest {
            is_active: false,
            ..rule_request("隐藏", 200, 0, 1990)
        })
        .await
        .unwrap();
    let removed = service.create_rule(rule_request("删除", 300, 0, 2990)).await.unwrap();
    service.delete_rule(removed.id).await.unwrap();

    let all = service.list_rules().await.unwrap();
    assert_eq!(all.len(), 2);
    let active = service.list_active_rules().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, basic.id);

    let user_id = uuid::Uuid::new_v4();
    let err = service.create_order(user_id, order_for(hidden.id)).await.unwrap_err();
    assert!(matches!(err, PlatformError::Business { .. }));
    let err = service.create_order(user_id, order_for(removed.id)).await.unwrap_err();
    assert!(matches!(err, PlatformError::NotFound { .. }));
}

#[tokio::test]
async fn test_confirm_paid_credits_power_once() {
    let (db, config) = seeded().await;
    let user_id = create_user(&db, &config, "payer").await;
    let service = RechargeService::new(db.clone());

    let rule = service.create_rule(rule_request("标准", 1000, 200, 4990)).await.unwrap();
    let order = service.create_order(user_id, order_for(rule.id)).await.unwrap();
    assert_eq!(order.pay_status, PayStatus::Unpaid);
    assert_eq!(order.pay_type, "manual");
    assert_eq!(order.sell_price, 4990);

    // 下单后修改套餐不影响订单快照
    service
        .update_rule(rule.id, rule_request("标准", 1, 0, 1))
        .await
        .unwrap();

    let paid = service.confirm_paid(order.id).await.unwrap();
    assert_eq!(paid.pay_status, PayStatus::Paid);
    assert!(paid.paid_at.is_some());

    let user = UserRepository::get_by_id(&db, user_id).await.unwrap();
    assert_eq!(user.power, 1200);

    let err = service.confirm_paid(order.id).await.unwrap_err();
    assert!(matches!(err, PlatformError::Conflict { .. }));
    let user = UserRepository::get_by_id(&db, user_id).await.unwrap();
    assert_eq!(user.power, 1200);

    let logs = FinanceService::new(db)
        .account_logs(
            AccountLogQuery {
                user_id: Some(user_id),
                change_type: None,
            },
            PaginationParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(logs.total, 1);
    assert_eq!(logs.items[0].change_type, AccountChangeType::Recharge);
    assert_eq!(logs.items[0].amount, 1200);
    assert_eq!(logs.items[0].balance_after, 1200);
    assert_eq!(logs.items[0].order_id, Some(order.id));
}

#[tokio::test]
async fn test_concurrent_confirm_paid_credits_once() {
    let (db, config) = seeded().await;
    let user_id = create_user(&db, &config, "racer").await;
    let service = RechargeService::new(db.clone());
    let rule = service.create_rule(rule_request("标准", 300, 0, 990)).await.unwrap();
    let order = service.create_order(user_id, order_for(rule.id)).await.unwrap();

    // 已有余额上做增量，不覆盖原值
    let user = UserRepository::get_by_id(&db, user_id).await.unwrap();
    let mut active: crate::db::entities::user::ActiveModel = user.into();
    active.power = sea_orm::Set(50);
    sea_orm::ActiveModelTrait::update(active, &db).await.unwrap();

    let (first, second) = tokio::join!(
        service.confirm_paid(order.id),
        service.confirm_paid(order.id)
    );
    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|err| matches!(err, PlatformError::Conflict { .. })));
    assert_eq!(UserRepository::get_by_id(&db, user_id).await.unwrap().power, 350);

    let logs = FinanceService::new(db)
        .account_logs(
            AccountLogQuery {
                user_id: Some(user_id),
                change_type: None,
            },
            PaginationParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(logs.total, 1);
    assert_eq!(logs.items[0].balance_after, 350);
}

#[tokio::test]
async fn test_refund_requires_paid_order_and_balance() {
    let (db, config) = seeded().await;
    let user_id = create_user(&db, &config, "refunder").await;
    let service = RechargeService::new(db.clone());
    let rule = service.create_rule(rule_request("标准", 500, 0, 1990)).await.unwrap();

    let unpaid = service.create_order(user_id, order_for(rule.id)).await.unwrap();
    let err = service.refund(unpaid.id).await.unwrap_err();
    assert!(matches!(err, PlatformError::Conflict { .. }));

    let order = service.create_order(user_id, order_for(rule.id)).await.unwrap();
    service.confirm_paid(order.id).await.unwrap();

    let refunded = service.refund(order.id).await.unwrap();
    assert_eq!(refunded.pay_status, PayStatus::Refunded);
    assert_eq!(UserRepository::get_by_id(&db, user_id).await.unwrap().power, 0);

    let err = service.refund(order.id).await.unwrap_err();
    assert!(matches!(err, PlatformError::Conflict { .. }));
    let err = service.confirm_paid(order.id).await.unwrap_err();
    assert!(matches!(err, PlatformError::Conflict { .. }));

    // 已消耗部分算力时余额不足，退款被拒绝且订单保持已支付
    let order = service.create_order(user_id, order_for(rule.id)).await.unwrap();
    service.confirm_paid(order.id).await.unwrap();
    let user = UserRepository::get_by_id(&db, user_id).await.unwrap();
    let mut active: crate::db::entities::user::ActiveModel = user.into();
    active.power = sea_orm::Set(100);
    sea_orm::ActiveModelTrait::update(active, &db).await.unwrap();

    let err = service.refund(order.id).await.unwrap_err();
    assert!(matches!(err, PlatformError::Business { .. }));
    let still_paid = service
        .list_orders(
            OrderQuery {
                order_no: Some(order.order_no.clone()),
                ..OrderQuery::default()
            },
            PaginationParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(still_paid.items[0].pay_status, PayStatus::Paid);
    assert_eq!(UserRepository::get_by_id(&db, user_id).await.unwrap().power, 100);
}

#[tokio::test]
async fn test_finance_center_totals() {
    let (db, config) = seeded().await;
    let first = create_user(&db, &config, "buyer1").await;
    let second = create_user(&db, &config, "buyer2").await;
    let service = RechargeService::new(db.clone());
    let small = service.create_rule(rule_request("小", 100, 10, 1000)).await.unwrap();
    let large = service.create_rule(rule_request("大", 1000, 100, 8000)).await.unwrap();

    let a = service.create_order(first, order_for(small.id)).await.unwrap();
    let b = service.create_order(second, order_for(large.id)).await.unwrap();
    let c = service.create_order(second, order_for(small.id)).await.unwrap();
    service.create_order(first, order_for(large.id)).await.unwrap();

    service.confirm_paid(a.id).await.unwrap();
    service.confirm_paid(b.id).await.unwrap();
    service.confirm_paid(c.id).await.unwrap();
    service.refund(c.id).await.unwrap();

    let center = FinanceService::new(db.clone()).center().await.unwrap();
    // 两个买家加上超级管理员
    assert_eq!(center.user_count, 3);
    assert_eq!(center.paid_order_count, 2);
    assert_eq!(center.revenue, 9000);
    assert_eq!(center.refunded_order_count, 1);
    assert_eq!(center.refunded_amount, 1000);
    assert_eq!(center.total_power_issued, 110 + 1100);

    let refunds = FinanceService::new(db)
        .account_logs(
            AccountLogQuery {
                user_id: None,
                change_type: Some(AccountChangeType::Refund),
            },
            PaginationParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(refunds.total, 1);
    assert_eq!(refunds.items[0].amount, -110);

    let mine = service.user_orders(second, PaginationParams::default()).await.unwrap();
    assert_eq!(mine.total, 2);
}
