use xmlfold::{try_decode, ErrorKind, Mapping, Value};

const WECHATPAY_NOTIFY: &str = include_str!("fixtures/wechatpay-notify.xml");
const COS_LIST_VERSIONS: &str = include_str!("fixtures/cos-list-object-versions.xml");
const WECHAT_REPLY_NEWS: &str = include_str!("fixtures/wechat-reply-news.xml");
const WECOM_APPROVAL: &str = include_str!("fixtures/wecom-event-approval.xml");
const XXE_INJECTION: &str = include_str!("fixtures/invalid-xxe-injection.xml");
const BILLION_LAUGHS: &str = include_str!("fixtures/invalid-billion-laughs.xml");
const FRAGMENT_INJECTION: &str = include_str!("fixtures/invalid-fragment-injection.xml");

fn text<'a>(value: Option<&'a Value>) -> Option<&'a str> {
    value.and_then(Value::as_text)
}

/// Walks every text value and checks no CDATA delimiter leaked through
fn assert_no_cdata_markers(value: &Value) {
    match value {
        Value::Text(text) => {
            assert!(!text.contains("<![CDATA["), "leaked CDATA opener: {text}");
            assert!(!text.contains("]]>"), "leaked CDATA closer: {text}");
        }
        Value::Mapping(mapping) => mapping.values().for_each(assert_no_cdata_markers),
        Value::Sequence(sequence) => sequence.iter().for_each(assert_no_cdata_markers),
        Value::Labeled(labeled) => labeled.items().iter().for_each(assert_no_cdata_markers),
    }
}

#[test]
fn test_wechatpay_notify_fields() -> Result<(), Box<dyn std::error::Error>> {
    let data = try_decode(WECHATPAY_NOTIFY)?;
    let keys = [
        "appid", "attach", "bank_type", "fee_type", "is_subscribe", "mch_id", "nonce_str",
        "openid", "out_trade_no", "result_code", "return_code", "sign", "time_end", "total_fee",
        "coupon_fee", "coupon_count", "coupon_type", "coupon_id", "trade_type", "transaction_id",
    ];
    for key in keys {
        assert!(data.get(key).is_some_and(Value::is_text), "missing text field {key}");
    }
    assert_eq!(data.len(), keys.len());
    assert_eq!(text(data.get("attach")), Some("支付测试"));
    assert_eq!(text(data.get("total_fee")), Some("1"));
    assert_no_cdata_markers(&Value::Mapping(data));
    Ok(())
}

#[test]
fn test_root_tag_is_collapsed() -> Result<(), Box<dyn std::error::Error>> {
    let data = try_decode(COS_LIST_VERSIONS)?;
    assert!(data.get("ListVersionsResult").is_none());
    assert_eq!(text(data.get("Name")), Some("examplebucket-1250000000"));
    assert_eq!(text(data.get("Prefix")), Some(""));
    Ok(())
}

#[test]
fn test_repeated_versions_become_sequence() -> Result<(), Box<dyn std::error::Error>> {
    let data = try_decode(COS_LIST_VERSIONS)?;
    let versions = data
        .get("Version")
        .and_then(Value::as_sequence)
        .ok_or("Version should be a sequence")?;
    assert_eq!(versions.len(), 3);

    let keys: Vec<_> = versions.iter().filter_map(|v| text(v.get("Key"))).collect();
    assert_eq!(
        keys,
        vec!["example-object-1.jpg", "example-object-1.jpg", "example-object-2.jpg"]
    );
    assert_eq!(
        text(versions.get(2).and_then(|v| v.get("StorageTier"))),
        Some("Standard")
    );
    assert_eq!(
        text(versions.get(0).and_then(|v| v.get("ETag"))),
        Some("\"5d1143df07a17b23320d0da161e2819e\"")
    );
    assert_eq!(
        text(
            versions
                .get(1)
                .and_then(|v| v.get("Owner"))
                .and_then(|o| o.get("DisplayName"))
        ),
        Some("1250000000")
    );

    // one DeleteMarker only, so it stays a mapping
    assert!(data.get("DeleteMarker").is_some_and(Value::is_mapping));
    Ok(())
}

#[test]
fn test_single_article_item_is_mapping() -> Result<(), Box<dyn std::error::Error>> {
    let data = try_decode(WECHAT_REPLY_NEWS)?;
    let item = data
        .get("Articles")
        .and_then(|a| a.get("item"))
        .and_then(Value::as_mapping)
        .ok_or("Articles.item should be a mapping")?;
    assert_eq!(text(item.get("Title")), Some("title1"));
    assert_eq!(text(item.get("Url")), Some("https://example.com/?a=1&b=2"));
    Ok(())
}

#[test]
fn test_nested_sequences_in_approval_event() -> Result<(), Box<dyn std::error::Error>> {
    let data = try_decode(WECOM_APPROVAL)?;
    let info = data.get("ApprovalInfo").ok_or("missing ApprovalInfo")?;
    let records = info
        .get("SpRecord")
        .and_then(Value::as_sequence)
        .ok_or("SpRecord should be a sequence")?;
    assert_eq!(records.len(), 2);

    let first_details = records.get(0).and_then(|r| r.get("Details"));
    assert_eq!(
        first_details.and_then(Value::as_sequence).map(|d| d.len()),
        Some(2)
    );
    let second_details = records.get(1).and_then(|r| r.get("Details"));
    assert!(second_details.is_some_and(Value::is_mapping));
    assert_eq!(
        text(second_details.and_then(|d| d.get("Speech"))),
        Some("")
    );
    assert_eq!(
        text(info.get("Comments").and_then(|c| c.get("CommentContent"))),
        Some("这个是备注")
    );
    assert_no_cdata_markers(&Value::Mapping(data));
    Ok(())
}

#[test]
fn test_xxe_entity_is_never_resolved() -> Result<(), Box<dyn std::error::Error>> {
    let data = try_decode(XXE_INJECTION)?;
    assert_eq!(text(data.get("return_code")), Some("SUCCESS"));
    assert_eq!(text(data.get("attach")), Some(""));
    Ok(())
}

#[test]
fn test_entity_expansion_is_never_performed() -> Result<(), Box<dyn std::error::Error>> {
    let data = try_decode(BILLION_LAUGHS)?;
    assert_eq!(text(data.get("lol")), Some(""));
    assert_eq!(text(data.get("ok")), Some("yes"));
    Ok(())
}

#[test]
fn test_fragment_inside_cdata_stays_text() -> Result<(), Box<dyn std::error::Error>> {
    let data = try_decode(FRAGMENT_INJECTION)?;
    assert_eq!(text(data.get("return_code")), Some("SUCCESS"));
    assert_eq!(
        text(data.get("attach")),
        Some("</attach><return_code>FAIL</return_code><attach>")
    );
    Ok(())
}

#[test]
fn test_undeclared_entity_is_an_error() {
    let err = try_decode("<xml><a>&ent;</a></xml>").err();
    assert_eq!(
        err.map(|e| e.kind().clone()),
        Some(ErrorKind::UndefinedEntity {
            name: "ent".to_string()
        })
    );
}

#[test]
fn test_concrete_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let xml = "<xml><appid>wx123</appid><detail><goods_detail><![CDATA[华为手机]]></goods_detail></detail></xml>";
    let expected = Mapping::new()
        .with("appid", "wx123")
        .with("detail", Mapping::new().with("goods_detail", "华为手机"));
    assert_eq!(try_decode(xml)?, expected);
    Ok(())
}

#[test]
fn test_leaf_text_keeps_inner_whitespace() -> Result<(), Box<dyn std::error::Error>> {
    let data = try_decode(
        "<xml>\r\n <a><![CDATA[x]]> <![CDATA[y]]></a>\r\n <b>x<!--c--> <!--c-->y</b><c>l1\r\nl2</c></xml>",
    )?;
    assert_eq!(text(data.get("a")), Some("x y"));
    assert_eq!(text(data.get("b")), Some("x y"));
    assert_eq!(text(data.get("c")), Some("l1\nl2"));
    assert_eq!(data.len(), 3);
    Ok(())
}
