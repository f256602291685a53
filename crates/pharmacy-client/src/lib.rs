use std::time::Duration;

use anyhow::Context;
use pharmacy_types::domain::medicine::{MedicinePatch, MedicineView, NewMedicine};
use pharmacy_types::domain::order::{OrderPatch, OrderStatus, OrderView};
use pharmacy_types::domain::summary::InventorySummary;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone)]
pub struct PharmacyClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct PharmacyClient {
    base: Url,
    client: reqwest::Client,
}

/// A non-2xx answer, with whatever the server said about it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{status}: {error}")]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub field: Option<String>,
    pub available: Option<i64>,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    field: Option<String>,
    available: Option<i64>,
}

async fn check(res: Response) -> anyhow::Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body: ErrorBody = res.json().await.unwrap_or_default();
    tracing::debug!(%status, error = %body.error, "request rejected");
    Err(ApiError {
        status,
        error: body.error,
        field: body.field,
        available: body.available,
    }
    .into())
}

impl PharmacyClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<PharmacyClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(PharmacyClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    pub async fn health(&self) -> anyhow::Result<()> {
        check(self.client.get(self.url("health")?).send().await?).await?;
        Ok(())
    }

    pub async fn create_medicine(&self, req: &NewMedicine) -> anyhow::Result<MedicineView> {
        let res = self
            .client
            .post(self.url("api/medicines")?)
            .json(req)
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn get_medicine(&self, id: Uuid) -> anyhow::Result<MedicineView> {
        let res = self
            .client
            .get(self.url(&format!("api/medicines/{id}"))?)
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    /// `in_stock` narrows the list to medicines with stock left.
    pub async fn list_medicines(&self, in_stock: bool) -> anyhow::Result<Vec<MedicineView>> {
        let mut req = self.client.get(self.url("api/medicines")?);
        if in_stock {
            req = req.query(&[("in_stock", "true")]);
        }
        Ok(check(req.send().await?).await?.json().await?)
    }

    pub async fn replace_medicine(
        &self,
        id: Uuid,
        req: &NewMedicine,
    ) -> anyhow::Result<MedicineView> {
        let res = self
            .client
            .put(self.url(&format!("api/medicines/{id}"))?)
            .json(req)
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn update_medicine(
        &self,
        id: Uuid,
        patch: &MedicinePatch,
    ) -> anyhow::Result<MedicineView> {
        let res = self
            .client
            .patch(self.url(&format!("api/medicines/{id}"))?)
            .json(patch)
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn delete_medicine(&self, id: Uuid) -> anyhow::Result<()> {
        let res = self
            .client
            .delete(self.url(&format!("api/medicines/{id}"))?)
            .send()
            .await?;
        check(res).await?;
        Ok(())
    }

    pub async fn create_order(&self, req: &CreateOrderRequest) -> anyhow::Result<OrderView> {
        let res = self
            .client
            .post(self.url("api/orders")?)
            .json(req)
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn get_order(&self, id: Uuid) -> anyhow::Result<OrderView> {
        let res = self
            .client
            .get(self.url(&format!("api/orders/{id}"))?)
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn list_orders(&self, status: Option<OrderStatus>) -> anyhow::Result<Vec<OrderView>> {
        let mut req = self.client.get(self.url("api/orders")?);
        if let Some(status) = status {
            req = req.query(&[("status", status.as_str())]);
        }
        Ok(check(req.send().await?).await?.json().await?)
    }

    pub async fn update_order(&self, id: Uuid, patch: &OrderPatch) -> anyhow::Result<OrderView> {
        let res = self
            .client
            .patch(self.url(&format!("api/orders/{id}"))?)
            .json(patch)
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> anyhow::Result<StatusChange> {
        let res = self
            .client
            .patch(self.url(&format!("api/orders/{id}/update_status"))?)
            .json(&UpdateStatusRequest { status })
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn delete_order(&self, id: Uuid) -> anyhow::Result<()> {
        let res = self
            .client
            .delete(self.url(&format!("api/orders/{id}"))?)
            .send()
            .await?;
        check(res).await?;
        Ok(())
    }

    pub async fn summary(&self) -> anyhow::Result<InventorySummary> {
        let res = self.client.get(self.url("api/summary")?).send().await?;
        Ok(check(res).await?.json().await?)
    }
}

impl PharmacyClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<PharmacyClient> {
        if let Some(client) = self.client {
            return Ok(PharmacyClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(PharmacyClient {
            base: self.base,
            client,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub medicine_id: Uuid,
    pub quantity: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub id: Uuid,
    pub status: OrderStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct UpdateStatusRequest {
    status: OrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as Days, Utc};
    use httpmock::prelude::*;
    use pharmacy_types::domain::medicine::Medicine;
    use pharmacy_types::domain::order::Order;

    fn sample_medicine() -> Medicine {
        let now = Utc::now();
        Medicine {
            id: Uuid::new_v4(),
            name: "Aspirin".into(),
            description: "Pain reliever".into(),
            price_cents: 999,
            stock: 100,
            expiry_date: now.date_naive() + Days::days(365),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_order(medicine: &Medicine) -> Order {
        Order {
            id: Uuid::new_v4(),
            customer_name: "Alice".into(),
            medicine_id: medicine.id,
            quantity: 2,
            status: OrderStatus::Pending,
            order_date: Utc::now(),
            total_price_cents: 2 * medicine.price_cents,
        }
    }

    #[tokio::test]
    async fn create_and_get_medicine() {
        let server = MockServer::start();
        let medicine = sample_medicine();
        let draft = NewMedicine {
            name: medicine.name.clone(),
            description: medicine.description.clone(),
            price_cents: medicine.price_cents,
            stock: medicine.stock,
            expiry_date: medicine.expiry_date,
        };
        let view = MedicineView::from(medicine.clone());

        let create_mock = server.mock(|when, then| {
            when.method(POST).path("/api/medicines").json_body_obj(&draft);
            then.status(201).json_body_obj(&view);
        });
        let get_mock = server.mock(|when, then| {
            when.method(GET)
                .path(format!("/api/medicines/{}", medicine.id));
            then.status(200).json_body_obj(&view);
        });
        let list_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/medicines")
                .query_param("in_stock", "true");
            then.status(200).json_body_obj(&vec![view.clone()]);
        });

        let client = PharmacyClient::new(&server.base_url()).unwrap();
        let created = client.create_medicine(&draft).await.unwrap();
        assert_eq!(created, view);
        assert!(created.is_in_stock);

        let fetched = client.get_medicine(medicine.id).await.unwrap();
        assert_eq!(fetched.medicine.name, "Aspirin");

        let listed = client.list_medicines(true).await.unwrap();
        assert_eq!(listed.len(), 1);

        create_mock.assert();
        get_mock.assert();
        list_mock.assert();
    }

    #[tokio::test]
    async fn order_calls_hit_expected_paths() {
        let server = MockServer::start();
        let medicine = sample_medicine();
        let order = sample_order(&medicine);
        let view = OrderView::new(order.clone(), &medicine);
        let req = CreateOrderRequest {
            customer_name: order.customer_name.clone(),
            medicine_id: medicine.id,
            quantity: order.quantity,
        };

        let create_mock = server.mock(|when, then| {
            when.method(POST).path("/api/orders").json_body_obj(&req);
            then.status(201).json_body_obj(&view);
        });
        let list_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/orders")
                .query_param("status", "Pending");
            then.status(200).json_body_obj(&vec![view.clone()]);
        });
        let status_mock = server.mock(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path(format!("/api/orders/{}/update_status", order.id))
                .json_body_obj(&UpdateStatusRequest {
                    status: OrderStatus::Shipped,
                });
            then.status(200).json_body_obj(&StatusChange {
                id: order.id,
                status: OrderStatus::Shipped,
            });
        });
        let delete_mock = server.mock(|when, then| {
            when.method(DELETE)
                .path(format!("/api/orders/{}", order.id));
            then.status(204);
        });

        let client = PharmacyClient::new(&server.base_url()).unwrap();
        let created = client.create_order(&req).await.unwrap();
        assert_eq!(created, view);
        assert_eq!(created.medicine_name, "Aspirin");
        assert_eq!(created.order.total_price_cents, 1998);

        let listed = client
            .list_orders(Some(OrderStatus::Pending))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);

        let change = client
            .update_status(order.id, OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(change.status, OrderStatus::Shipped);

        client.delete_order(order.id).await.unwrap();

        create_mock.assert();
        list_mock.assert();
        status_mock.assert();
        delete_mock.assert();
    }

    #[tokio::test]
    async fn rejection_surfaces_api_error() {
        let server = MockServer::start();
        let medicine_id = Uuid::new_v4();
        server.mock(|when, then| {
            when.method(POST).path("/api/orders");
            then.status(400).json_body(serde_json::json!({
                "error": "Insufficient stock. Only 3 units available.",
                "field": "quantity",
                "available": 3,
            }));
        });

        let client = PharmacyClient::builder(&server.base_url())
            .unwrap()
            .with_timeout(std::time::Duration::from_secs(5))
            .with_header("x-client", "tests")
            .unwrap()
            .build()
            .unwrap();
        let err = client
            .create_order(&CreateOrderRequest {
                customer_name: "Bob".into(),
                medicine_id,
                quantity: 9,
            })
            .await
            .unwrap_err();
        let api = err.downcast_ref::<ApiError>().expect("api error");
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.field.as_deref(), Some("quantity"));
        assert_eq!(api.available, Some(3));
    }
}
