use awb_recon::{api, AppConfig};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Value};
use tower::ServiceExt;

const AWB_LINE: &str =
    "141 1234567 8 TLV JFK 560.00K 1.00 2.00 3.00 4.00 5.00 6.00 7.00 8.00 9.00 100.00 1.00000000 I 100.00";

async fn post_json(body: Value) -> (StatusCode, Value) {
    let app = api::router(&AppConfig::default());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/reconcile")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_returns_ok() {
    let app = api::router(&AppConfig::default());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn pages_with_csv_report_are_reconciled() {
    let csv = "AWBPrefix,AWBSuffix,ChargeWt,Frt_Cost_Rate,Total_Cost\n141,12345678,560,0.5,90\n";
    let (status, body) = post_json(json!({
        "pages": ["cover", format!("{AWB_LINE}\n01JAN25 0.50")],
        "excel_file": BASE64.encode(csv),
        "report_format": "csv",
    }))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["invoices_rows"], json!(1));
    assert_eq!(body["cca_rows"], json!(0));
    assert_eq!(body["reconciliation"]["status"], json!("completed"));

    let workbook = BASE64.decode(body["excel_file"].as_str().unwrap()).unwrap();
    assert!(workbook.starts_with(b"PK"));
}

#[tokio::test]
async fn report_missing_columns_is_not_fatal() {
    let csv = "AWBPrefix,AWBSuffix\n141,12345678\n";
    let (status, body) = post_json(json!({
        "pages": ["cover", format!("{AWB_LINE}\n01JAN25 0.50")],
        "excel_file": BASE64.encode(csv),
        "report_format": "csv",
    }))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reconciliation"]["status"], json!("skipped_missing_columns"));
    assert_eq!(
        body["reconciliation"]["detail"],
        json!(["chargewt", "frt_cost_rate", "total_cost"])
    );
}

#[tokio::test]
async fn document_without_data_is_unprocessable() {
    let (status, body) = post_json(json!({ "pages": ["cover", "nothing here"] })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn malformed_inputs_are_rejected() {
    let (status, _) = post_json(json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(json!({ "pdf_file": "not base64!!" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("pdf_file"));

    let (status, _) = post_json(json!({ "pdf_file": "", "pages": ["cover"] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreadable_pdf_is_a_server_error() {
    let (status, body) = post_json(json!({ "pdf_file": BASE64.encode(b"definitely not a pdf") })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
}
