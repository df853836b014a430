//! Alert configuration of an observability instance.
//!
//! The attribute model is a nested object of receivers, a route tree and
//! optional global settings. It is mapped to and from the Alertmanager-style
//! payload of the API in both directions.
//!
//! Two quirks of the API shape the mapping:
//!
//! - The route tree supports only [`MAX_ROUTE_DEPTH`] levels of child routes.
//!   Deeper trees are rejected in both directions.
//! - An alert configuration can not be deleted once set. Clearing the
//!   attribute writes a fixed placeholder configuration instead, and reading
//!   that placeholder back yields [`AlertConfigState::Empty`], which is shown
//!   as an unset attribute.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::observability::{
    AlertConfigPayload, EmailConfigPayload, GetAlertConfigResponse, GlobalPayload,
    OpsgenieConfigPayload, ReceiverPayload, RoutePayload, WebHookConfigPayload,
};
use crate::error::{ProviderError, Result};
use crate::resource::required;
use crate::schema::{Attribute, AttributeFlags, NestedAttributes, ObjectValidator, Validator};

/// How many levels of child routes the root route may carry.
pub const MAX_ROUTE_DEPTH: usize = 1;

/// The `alert_config` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfigModel {
    pub receivers: Option<Vec<ReceiverModel>>,
    pub route: Option<RouteModel>,
    pub global: Option<GlobalModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverModel {
    pub name: String,
    pub email_configs: Option<Vec<EmailConfigModel>>,
    pub opsgenie_configs: Option<Vec<OpsgenieConfigModel>>,
    pub webhooks_configs: Option<Vec<WebhookConfigModel>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfigModel {
    pub auth_identity: Option<String>,
    pub auth_password: Option<String>,
    pub auth_username: Option<String>,
    pub from: Option<String>,
    pub send_resolved: Option<bool>,
    pub smart_host: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpsgenieConfigModel {
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub priority: Option<String>,
    pub send_resolved: Option<bool>,
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfigModel {
    pub google_chat: Option<bool>,
    pub ms_teams: Option<bool>,
    pub send_resolved: Option<bool>,
    pub url: Option<String>,
}

/// The root of the route tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteModel {
    pub group_by: Option<Vec<String>>,
    pub group_interval: Option<String>,
    pub group_wait: Option<String>,
    pub receiver: Option<String>,
    pub repeat_interval: Option<String>,
    pub routes: Option<Vec<ChildRoute>>,
}

/// Settings of a route below the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChildRouteModel {
    #[serde(rename = "continue")]
    pub continue_matching: Option<bool>,
    pub group_by: Option<Vec<String>>,
    pub group_interval: Option<String>,
    pub group_wait: Option<String>,
    #[serde(rename = "match")]
    pub match_labels: Option<BTreeMap<String, String>>,
    pub match_regex: Option<BTreeMap<String, String>>,
    pub matchers: Option<Vec<String>>,
    pub receiver: Option<String>,
    pub repeat_interval: Option<String>,
}

/// A route below the root, discriminated by the presence of a `routes` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildRoute {
    /// A route without children.
    Leaf(ChildRouteModel),
    /// A route carrying its own child routes.
    Nested {
        route: ChildRouteModel,
        routes: Vec<ChildRoute>,
    },
}

impl ChildRoute {
    fn route(&self) -> &ChildRouteModel {
        match self {
            ChildRoute::Leaf(route) | ChildRoute::Nested { route, .. } => route,
        }
    }
}

impl<'de> Deserialize<'de> for ChildRoute {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut object = Map::<String, Value>::deserialize(deserializer)?;
        let routes = object.remove("routes").filter(|v| !v.is_null());
        let route = ChildRouteModel::deserialize(Value::Object(object)).map_err(de::Error::custom)?;
        match routes {
            None => Ok(ChildRoute::Leaf(route)),
            Some(routes) => {
                let routes = Vec::<ChildRoute>::deserialize(routes).map_err(de::Error::custom)?;
                Ok(ChildRoute::Nested { route, routes })
            },
        }
    }
}

impl Serialize for ChildRoute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct WithRoutes<'a> {
            #[serde(flatten)]
            route: &'a ChildRouteModel,
            routes: &'a [ChildRoute],
        }

        match self {
            ChildRoute::Leaf(route) => route.serialize(serializer),
            ChildRoute::Nested { route, routes } => WithRoutes { route, routes }.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalModel {
    pub opsgenie_api_key: Option<String>,
    pub opsgenie_api_url: Option<String>,
    pub resolve_timeout: Option<String>,
    pub smtp_auth_identity: Option<String>,
    pub smtp_auth_password: Option<String>,
    pub smtp_auth_username: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_smart_host: Option<String>,
}

/// What the remote side holds, as far as the attribute is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertConfigState {
    /// No alert configuration exists, or none is wanted.
    Unset,
    /// The placeholder configuration written when the attribute was cleared.
    Empty,
    /// A user-defined configuration.
    Present(AlertConfigModel),
}

impl AlertConfigState {
    /// Map the API answer into a state.
    ///
    /// Secrets the API withholds on read are taken from `prior`.
    pub fn from_response(
        response: &GetAlertConfigResponse,
        prior: Option<&AlertConfigModel>,
    ) -> Result<Self> {
        let Some(payload) = &response.data else {
            return Ok(Self::Unset);
        };
        let mut model = model_from_payload(payload)?;
        // The API may withhold receiver secrets on read, so the placeholder is
        // recognised by its non-secret fields only.
        if without_secrets(&model) == without_secrets(&mock_model()?) {
            return Ok(Self::Empty);
        }
        backfill_global(&mut model, prior);
        Ok(Self::Present(model))
    }

    /// The state to write for a planned attribute value.
    ///
    /// Clearing a previously set configuration yields [`AlertConfigState::Empty`].
    pub fn from_plan(planned: Option<AlertConfigModel>, prior: Option<&AlertConfigModel>) -> Self {
        match (planned, prior) {
            (Some(model), _) => Self::Present(model),
            (None, Some(_)) => Self::Empty,
            (None, None) => Self::Unset,
        }
    }

    /// The payload to send, or `None` when nothing has to be written.
    pub fn to_payload(&self) -> Result<Option<AlertConfigPayload>> {
        match self {
            Self::Unset => Ok(None),
            Self::Empty => Ok(Some(mock_payload())),
            Self::Present(model) => to_payload(model).map(Some),
        }
    }

    /// The attribute value; both `Unset` and `Empty` read as unset.
    pub fn into_model(self) -> Option<AlertConfigModel> {
        match self {
            Self::Present(model) => Some(model),
            Self::Unset | Self::Empty => None,
        }
    }
}

/// The placeholder written in place of a deleted alert configuration.
pub fn mock_payload() -> AlertConfigPayload {
    let email = "xxxx@gmail.com".to_string();
    AlertConfigPayload {
        receivers: vec![ReceiverPayload {
            name: "email-me".into(),
            email_configs: Some(vec![EmailConfigPayload {
                auth_identity: Some(email.clone()),
                auth_password: Some("xxxxxxxxx".into()),
                auth_username: Some(email.clone()),
                from: Some(email),
                smarthost: Some("smtp.gmail.com:587".into()),
                to: Some("123@gmail.com".into()),
                send_resolved: None,
            }]),
            opsgenie_configs: None,
            web_hook_configs: None,
        }],
        route: RoutePayload {
            receiver: Some("email-me".into()),
            group_by: Some(vec!["alertname".into()]),
            group_wait: Some("30s".into()),
            group_interval: Some("5m".into()),
            repeat_interval: Some("4h".into()),
            ..Default::default()
        },
        global: Some(GlobalPayload {
            resolve_timeout: Some("5m".into()),
            smtp_from: Some("test@example.com".into()),
            ..Default::default()
        }),
    }
}

fn mock_model() -> Result<AlertConfigModel> {
    model_from_payload(&mock_payload())
}

fn without_secrets(model: &AlertConfigModel) -> AlertConfigModel {
    let mut masked = model.clone();
    for receiver in masked.receivers.iter_mut().flatten() {
        for email in receiver.email_configs.iter_mut().flatten() {
            email.auth_password = None;
        }
        for opsgenie in receiver.opsgenie_configs.iter_mut().flatten() {
            opsgenie.api_key = None;
        }
    }
    if let Some(global) = masked.global.as_mut() {
        global.smtp_auth_password = None;
        global.opsgenie_api_key = None;
    }
    masked
}

/// Reject route trees nested deeper than [`MAX_ROUTE_DEPTH`].
pub fn check_route_depth(model: &AlertConfigModel) -> Result<()> {
    let Some(routes) = model.route.as_ref().and_then(|r| r.routes.as_ref()) else {
        return Ok(());
    };
    check_children(routes, 1, "alert_config.route.routes")
}

fn check_children(routes: &[ChildRoute], depth: usize, path: &str) -> Result<()> {
    for (i, child) in routes.iter().enumerate() {
        if let ChildRoute::Nested { routes, .. } = child {
            let nested_path = format!("{}.{}.routes", path, i);
            if depth >= MAX_ROUTE_DEPTH {
                return Err(depth_error(&nested_path));
            }
            check_children(routes, depth + 1, &nested_path)?;
        }
    }
    Ok(())
}

fn depth_error(path: &str) -> ProviderError {
    ProviderError::attribute(
        path,
        "Route tree nested too deep",
        format!(
            "Child routes may be nested at most {} level(s) below the root route",
            MAX_ROUTE_DEPTH
        ),
    )
}

fn collapse<T, U>(items: &Option<Vec<T>>, map: impl Fn(&T) -> U) -> Option<Vec<U>> {
    match items {
        Some(items) if !items.is_empty() => Some(items.iter().map(map).collect()),
        _ => None,
    }
}

fn collapse_map(map: &Option<BTreeMap<String, String>>) -> Option<BTreeMap<String, String>> {
    map.clone().filter(|m| !m.is_empty())
}

/// Map an API alert configuration into the attribute model.
pub fn model_from_payload(payload: &AlertConfigPayload) -> Result<AlertConfigModel> {
    let receivers = payload
        .receivers
        .iter()
        .map(|r| ReceiverModel {
            name: r.name.clone(),
            email_configs: collapse(&r.email_configs, |e| EmailConfigModel {
                auth_identity: e.auth_identity.clone(),
                auth_password: e.auth_password.clone(),
                auth_username: e.auth_username.clone(),
                from: e.from.clone(),
                send_resolved: e.send_resolved,
                smart_host: e.smarthost.clone(),
                to: e.to.clone(),
            }),
            opsgenie_configs: collapse(&r.opsgenie_configs, |o| OpsgenieConfigModel {
                api_key: o.api_key.clone(),
                api_url: o.api_url.clone(),
                priority: o.priority.clone(),
                send_resolved: o.send_resolved,
                tags: o.tags.clone(),
            }),
            webhooks_configs: collapse(&r.web_hook_configs, |w| WebhookConfigModel {
                google_chat: w.google_chat,
                ms_teams: w.ms_teams,
                send_resolved: w.send_resolved,
                url: w.url.clone(),
            }),
        })
        .collect();

    let root = &payload.route;
    let route = RouteModel {
        group_by: root.group_by.clone(),
        group_interval: root.group_interval.clone(),
        group_wait: root.group_wait.clone(),
        receiver: root.receiver.clone(),
        repeat_interval: root.repeat_interval.clone(),
        routes: children_from_payload(&root.routes, 1, "alert_config.route.routes")?,
    };

    let global = payload.global.as_ref().map(|g| GlobalModel {
        opsgenie_api_key: g.opsgenie_api_key.clone(),
        opsgenie_api_url: g.opsgenie_api_url.clone(),
        resolve_timeout: g.resolve_timeout.clone(),
        smtp_auth_identity: g.smtp_auth_identity.clone(),
        smtp_auth_password: g.smtp_auth_password.clone(),
        smtp_auth_username: g.smtp_auth_username.clone(),
        smtp_from: g.smtp_from.clone(),
        smtp_smart_host: g.smtp_smarthost.clone(),
    });

    Ok(AlertConfigModel {
        receivers: Some(receivers),
        route: Some(route),
        global,
    })
}

fn children_from_payload(
    routes: &Option<Vec<RoutePayload>>,
    depth: usize,
    path: &str,
) -> Result<Option<Vec<ChildRoute>>> {
    let Some(routes) = routes.as_ref().filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    let mut children = Vec::with_capacity(routes.len());
    for (i, payload) in routes.iter().enumerate() {
        let route = ChildRouteModel {
            continue_matching: payload.continue_matching,
            group_by: payload.group_by.clone(),
            group_interval: payload.group_interval.clone(),
            group_wait: payload.group_wait.clone(),
            match_labels: collapse_map(&payload.match_labels),
            match_regex: collapse_map(&payload.match_re),
            matchers: collapse(&payload.matchers, String::clone),
            receiver: payload.receiver.clone(),
            repeat_interval: payload.repeat_interval.clone(),
        };
        let nested_path = format!("{}.{}.routes", path, i);
        match payload.routes.as_ref().filter(|r| !r.is_empty()) {
            None => children.push(ChildRoute::Leaf(route)),
            Some(_) if depth >= MAX_ROUTE_DEPTH => return Err(depth_error(&nested_path)),
            Some(_) => {
                let routes = children_from_payload(&payload.routes, depth + 1, &nested_path)?
                    .unwrap_or_default();
                children.push(ChildRoute::Nested { route, routes });
            },
        }
    }
    Ok(Some(children))
}

fn backfill_global(model: &mut AlertConfigModel, prior: Option<&AlertConfigModel>) {
    let (Some(global), Some(prior)) = (
        model.global.as_mut(),
        prior.and_then(|p| p.global.as_ref()),
    ) else {
        return;
    };
    let keep = |field: &mut Option<String>, previous: &Option<String>| {
        if field.is_none() {
            field.clone_from(previous);
        }
    };
    keep(&mut global.smtp_auth_identity, &prior.smtp_auth_identity);
    keep(&mut global.smtp_auth_password, &prior.smtp_auth_password);
    keep(&mut global.smtp_auth_username, &prior.smtp_auth_username);
    keep(&mut global.smtp_smart_host, &prior.smtp_smart_host);
    keep(&mut global.opsgenie_api_key, &prior.opsgenie_api_key);
    keep(&mut global.opsgenie_api_url, &prior.opsgenie_api_url);
}

/// Build the API payload for an attribute value.
///
/// Receivers and route are mandatory. Unset channel lists stay absent in the
/// payload while empty lists are sent as empty arrays.
pub fn to_payload(model: &AlertConfigModel) -> Result<AlertConfigPayload> {
    let receivers = required(&model.receivers, "alert_config.receivers")?;
    let route = required(&model.route, "alert_config.route")?;

    let receivers = receivers
        .iter()
        .map(|r| ReceiverPayload {
            name: r.name.clone(),
            email_configs: r.email_configs.as_ref().map(|configs| {
                configs
                    .iter()
                    .map(|e| EmailConfigPayload {
                        auth_identity: e.auth_identity.clone(),
                        auth_password: e.auth_password.clone(),
                        auth_username: e.auth_username.clone(),
                        from: e.from.clone(),
                        smarthost: e.smart_host.clone(),
                        to: e.to.clone(),
                        send_resolved: e.send_resolved,
                    })
                    .collect()
            }),
            opsgenie_configs: r.opsgenie_configs.as_ref().map(|configs| {
                configs
                    .iter()
                    .map(|o| OpsgenieConfigPayload {
                        api_key: o.api_key.clone(),
                        api_url: o.api_url.clone(),
                        tags: o.tags.clone(),
                        priority: o.priority.clone(),
                        send_resolved: o.send_resolved,
                    })
                    .collect()
            }),
            web_hook_configs: r.webhooks_configs.as_ref().map(|configs| {
                configs
                    .iter()
                    .map(|w| WebHookConfigPayload {
                        url: w.url.clone(),
                        ms_teams: w.ms_teams,
                        google_chat: w.google_chat,
                        send_resolved: w.send_resolved,
                    })
                    .collect()
            }),
        })
        .collect();

    let routes = match &route.routes {
        Some(children) => Some(children_to_payload(children, 1, "alert_config.route.routes")?),
        None => None,
    };
    let route = RoutePayload {
        receiver: route.receiver.clone(),
        group_by: route.group_by.clone(),
        group_wait: route.group_wait.clone(),
        group_interval: route.group_interval.clone(),
        repeat_interval: route.repeat_interval.clone(),
        routes,
        ..Default::default()
    };

    let global = model.global.as_ref().map(|g| GlobalPayload {
        opsgenie_api_key: g.opsgenie_api_key.clone(),
        opsgenie_api_url: g.opsgenie_api_url.clone(),
        resolve_timeout: g.resolve_timeout.clone(),
        smtp_auth_identity: g.smtp_auth_identity.clone(),
        smtp_auth_password: g.smtp_auth_password.clone(),
        smtp_auth_username: g.smtp_auth_username.clone(),
        smtp_from: g.smtp_from.clone(),
        smtp_smarthost: g.smtp_smart_host.clone(),
    });

    Ok(AlertConfigPayload {
        receivers,
        route,
        global,
    })
}

fn children_to_payload(children: &[ChildRoute], depth: usize, path: &str) -> Result<Vec<RoutePayload>> {
    children
        .iter()
        .enumerate()
        .map(|(i, child)| {
            let route = child.route();
            let routes = match child {
                ChildRoute::Leaf(_) => None,
                ChildRoute::Nested { routes, .. } => {
                    let nested_path = format!("{}.{}.routes", path, i);
                    if depth >= MAX_ROUTE_DEPTH {
                        return Err(depth_error(&nested_path));
                    }
                    Some(children_to_payload(routes, depth + 1, &nested_path)?)
                },
            };
            Ok(RoutePayload {
                receiver: route.receiver.clone(),
                group_by: route.group_by.clone(),
                group_wait: route.group_wait.clone(),
                group_interval: route.group_interval.clone(),
                repeat_interval: route.repeat_interval.clone(),
                match_labels: route.match_labels.clone(),
                match_re: route.match_regex.clone(),
                matchers: route.matchers.clone(),
                continue_matching: route.continue_matching,
                routes,
            })
        })
        .collect()
}

fn timing_attributes(nested: NestedAttributes) -> NestedAttributes {
    nested
        .with_attribute(
            "group_by",
            Attribute::optional_string_list()
                .with_description("Labels by which incoming alerts are grouped together."),
        )
        .with_attribute(
            "group_interval",
            Attribute::optional_string()
                .with_description("How long to wait before sending a notification about new alerts in a group."),
        )
        .with_attribute(
            "group_wait",
            Attribute::optional_string()
                .with_description("How long to initially wait to send a notification for a group."),
        )
        .with_attribute(
            "receiver",
            Attribute::required_string().with_description("Name of the receiver handling the alerts."),
        )
        .with_attribute(
            "repeat_interval",
            Attribute::optional_string()
                .with_description("How long to wait before re-sending a notification."),
        )
}

/// The `alert_config` attribute of the instance schema.
pub fn schema_attribute() -> Attribute {
    let email = NestedAttributes::list()
        .with_attribute("auth_identity", Attribute::optional_string())
        .with_attribute("auth_password", Attribute::optional_string().sensitive())
        .with_attribute("auth_username", Attribute::optional_string())
        .with_attribute("from", Attribute::optional_string())
        .with_attribute("send_resolved", Attribute::optional_bool())
        .with_attribute(
            "smart_host",
            Attribute::optional_string().with_description("SMTP host, e.g. `smtp.example.com:587`."),
        )
        .with_attribute("to", Attribute::optional_string());

    let opsgenie = NestedAttributes::list()
        .with_attribute("api_key", Attribute::optional_string().sensitive())
        .with_attribute("api_url", Attribute::optional_string())
        .with_attribute(
            "priority",
            Attribute::optional_string().with_validator(Validator::OneOf(
                ["P1", "P2", "P3", "P4", "P5"].iter().map(|p| p.to_string()).collect(),
            )),
        )
        .with_attribute("send_resolved", Attribute::optional_bool())
        .with_attribute("tags", Attribute::optional_string());

    let webhook = NestedAttributes::list()
        .with_attribute("google_chat", Attribute::optional_bool())
        .with_attribute(
            "ms_teams",
            Attribute::optional_bool().with_description("Format the payload for Microsoft Teams."),
        )
        .with_attribute("send_resolved", Attribute::optional_bool())
        .with_attribute("url", Attribute::required_string())
        .with_validator(ObjectValidator::AtMostOneTrue(vec![
            "ms_teams".into(),
            "google_chat".into(),
        ]));

    let receivers = NestedAttributes::list()
        .with_attribute(
            "name",
            Attribute::required_string().with_validator(Validator::LengthAtLeast(1)),
        )
        .with_attribute("email_configs", Attribute::nested(email, AttributeFlags::optional()))
        .with_attribute("opsgenie_configs", Attribute::nested(opsgenie, AttributeFlags::optional()))
        .with_attribute("webhooks_configs", Attribute::nested(webhook, AttributeFlags::optional()));

    let child_routes = timing_attributes(NestedAttributes::list())
        .with_attribute(
            "continue",
            Attribute::optional_bool()
                .with_description("Whether matching continues with the sibling routes."),
        )
        .with_attribute(
            "match",
            Attribute::optional_string_map()
                .with_description("Equality matchers. Deprecated in favor of `matchers`."),
        )
        .with_attribute(
            "match_regex",
            Attribute::optional_string_map()
                .with_description("Regex matchers. Deprecated in favor of `matchers`."),
        )
        .with_attribute("matchers", Attribute::optional_string_list());

    let route = timing_attributes(NestedAttributes::single()).with_attribute(
        "routes",
        Attribute::nested(child_routes, AttributeFlags::optional()),
    );

    let global = NestedAttributes::single()
        .with_attribute("opsgenie_api_key", Attribute::optional_string().sensitive())
        .with_attribute("opsgenie_api_url", Attribute::optional_string())
        .with_attribute("resolve_timeout", Attribute::optional_string())
        .with_attribute("smtp_auth_identity", Attribute::optional_string())
        .with_attribute("smtp_auth_password", Attribute::optional_string().sensitive())
        .with_attribute("smtp_auth_username", Attribute::optional_string())
        .with_attribute("smtp_from", Attribute::optional_string())
        .with_attribute("smtp_smart_host", Attribute::optional_string());

    let alert_config = NestedAttributes::single()
        .with_attribute("receivers", Attribute::nested(receivers, AttributeFlags::required()))
        .with_attribute("route", Attribute::nested(route, AttributeFlags::required()))
        .with_attribute("global", Attribute::nested(global, AttributeFlags::optional()));

    Attribute::nested(alert_config, AttributeFlags::optional())
        .with_description("Alertmanager configuration: receivers, routing tree and global settings.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn receiver_payload(email: Option<Vec<EmailConfigPayload>>) -> ReceiverPayload {
        ReceiverPayload {
            name: "team".into(),
            email_configs: email,
            opsgenie_configs: None,
            web_hook_configs: None,
        }
    }

    fn payload_with(receiver: ReceiverPayload) -> AlertConfigPayload {
        AlertConfigPayload {
            receivers: vec![receiver],
            route: RoutePayload {
                receiver: Some("team".into()),
                ..Default::default()
            },
            global: None,
        }
    }

    #[test]
    fn test_mock_collapses_to_empty() {
        let response = GetAlertConfigResponse {
            data: Some(mock_payload()),
        };
        assert_eq!(
            AlertConfigState::from_response(&response, None).unwrap(),
            AlertConfigState::Empty
        );

        let prior = AlertConfigModel {
            global: Some(GlobalModel {
                smtp_auth_password: Some("secret".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let state = AlertConfigState::from_response(&response, Some(&prior)).unwrap();
        assert_eq!(state, AlertConfigState::Empty);
        assert_eq!(state.into_model(), None);
    }

    #[test]
    fn test_absent_data_is_unset() {
        let state = AlertConfigState::from_response(&GetAlertConfigResponse::default(), None).unwrap();
        assert_eq!(state, AlertConfigState::Unset);
    }

    #[test]
    fn test_channel_lists_collapse_independently() {
        let mut with_empty = receiver_payload(Some(vec![]));
        let without = receiver_payload(None);
        let a = model_from_payload(&payload_with(with_empty.clone())).unwrap();
        let b = model_from_payload(&payload_with(without.clone())).unwrap();
        assert_eq!(a, b);

        with_empty.email_configs = None;
        with_empty.opsgenie_configs = Some(vec![]);
        let mut absent = without.clone();
        absent.opsgenie_configs = None;
        assert_eq!(
            model_from_payload(&payload_with(with_empty.clone())).unwrap(),
            model_from_payload(&payload_with(absent)).unwrap()
        );

        with_empty.opsgenie_configs = None;
        with_empty.web_hook_configs = Some(vec![]);
        let receivers = model_from_payload(&payload_with(with_empty)).unwrap().receivers.unwrap();
        assert_eq!(receivers[0].webhooks_configs, None);
    }

    #[test]
    fn test_empty_list_kept_on_write() {
        let model = AlertConfigModel {
            receivers: Some(vec![ReceiverModel {
                name: "team".into(),
                email_configs: Some(vec![]),
                ..Default::default()
            }]),
            route: Some(RouteModel {
                receiver: Some("team".into()),
                ..Default::default()
            }),
            global: None,
        };
        let payload = to_payload(&model).unwrap();
        assert_eq!(payload.receivers[0].email_configs, Some(vec![]));
        assert_eq!(payload.receivers[0].opsgenie_configs, None);
        assert!(payload.global.is_none());
    }

    #[test]
    fn test_present_empty_global_is_sent() {
        let model = AlertConfigModel {
            receivers: Some(vec![]),
            route: Some(RouteModel::default()),
            global: Some(GlobalModel::default()),
        };
        let value = serde_json::to_value(to_payload(&model).unwrap()).unwrap();
        assert_eq!(value["global"], json!({}));
    }

    #[test]
    fn test_missing_receivers_or_route_fails() {
        let err = to_payload(&AlertConfigModel {
            route: Some(RouteModel::default()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("alert_config.receivers"));

        let err = to_payload(&AlertConfigModel {
            receivers: Some(vec![]),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("alert_config.route"));
    }

    #[test]
    fn test_leaf_child_routes_decode() {
        let model: AlertConfigModel = serde_json::from_value(json!({
            "receivers": [{"name": "team", "email_configs": null}],
            "route": {
                "receiver": "team",
                "group_by": ["alertname"],
                "routes": [
                    {"receiver": "team", "matchers": ["severity=\"critical\""], "continue": true},
                    {"receiver": "team", "match": {"env": "prod"}}
                ]
            },
            "global": null
        }))
        .unwrap();

        let expected = AlertConfigPayload {
            receivers: vec![receiver_payload(None)],
            route: RoutePayload {
                receiver: Some("team".into()),
                group_by: Some(vec!["alertname".into()]),
                routes: Some(vec![
                    RoutePayload {
                        receiver: Some("team".into()),
                        matchers: Some(vec!["severity=\"critical\"".into()]),
                        continue_matching: Some(true),
                        ..Default::default()
                    },
                    RoutePayload {
                        receiver: Some("team".into()),
                        match_labels: Some(BTreeMap::from([("env".to_string(), "prod".to_string())])),
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            },
            global: None,
        };
        assert_eq!(to_payload(&model).unwrap(), expected);
    }

    #[test]
    fn test_child_route_shape_discrimination() {
        let leaf: ChildRoute = serde_json::from_value(json!({"receiver": "a"})).unwrap();
        assert!(matches!(leaf, ChildRoute::Leaf(_)));
        let leaf: ChildRoute = serde_json::from_value(json!({"receiver": "a", "routes": null})).unwrap();
        assert!(matches!(leaf, ChildRoute::Leaf(_)));
        let nested: ChildRoute =
            serde_json::from_value(json!({"receiver": "a", "routes": [{"receiver": "b"}]})).unwrap();
        assert!(matches!(nested, ChildRoute::Nested { ref routes, .. } if routes.len() == 1));
    }

    #[test]
    fn test_too_deep_route_rejected() {
        let model: AlertConfigModel = serde_json::from_value(json!({
            "receivers": [],
            "route": {
                "receiver": "a",
                "routes": [{"receiver": "b", "routes": [{"receiver": "c"}]}]
            }
        }))
        .unwrap();
        let err = check_route_depth(&model).unwrap_err();
        assert!(err.to_string().contains("alert_config.route.routes.0.routes"));
        assert!(to_payload(&model).is_err());

        let deep = AlertConfigPayload {
            route: RoutePayload {
                routes: Some(vec![RoutePayload {
                    routes: Some(vec![RoutePayload::default()]),
                    ..Default::default()
                }]),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(model_from_payload(&deep).is_err());
    }

    #[test]
    fn test_secrets_backfilled_from_prior() {
        let mut payload = payload_with(receiver_payload(None));
        payload.global = Some(GlobalPayload {
            resolve_timeout: Some("1m".into()),
            ..Default::default()
        });
        let prior = AlertConfigModel {
            global: Some(GlobalModel {
                smtp_auth_password: Some("secret".into()),
                opsgenie_api_key: Some("key".into()),
                resolve_timeout: Some("5m".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let response = GetAlertConfigResponse { data: Some(payload) };
        let model = AlertConfigState::from_response(&response, Some(&prior))
            .unwrap()
            .into_model()
            .unwrap();
        let global = model.global.unwrap();
        assert_eq!(global.smtp_auth_password.as_deref(), Some("secret"));
        assert_eq!(global.opsgenie_api_key.as_deref(), Some("key"));
        assert_eq!(global.resolve_timeout.as_deref(), Some("1m"));
    }

    #[test]
    fn test_placeholder_recognised_without_secrets() {
        let mut payload = mock_payload();
        for receiver in &mut payload.receivers {
            for email in receiver.email_configs.iter_mut().flatten() {
                email.auth_password = None;
            }
        }
        let response = GetAlertConfigResponse { data: Some(payload) };
        assert_eq!(
            AlertConfigState::from_response(&response, None).unwrap(),
            AlertConfigState::Empty
        );

        let mut real = mock_payload();
        real.receivers[0].name = "team".into();
        real.route.receiver = Some("team".into());
        let response = GetAlertConfigResponse { data: Some(real) };
        assert!(matches!(
            AlertConfigState::from_response(&response, None).unwrap(),
            AlertConfigState::Present(_)
        ));
    }

    #[test]
    fn test_clearing_writes_mock() {
        let prior = AlertConfigModel::default();
        let state = AlertConfigState::from_plan(None, Some(&prior));
        assert_eq!(state, AlertConfigState::Empty);
        assert_eq!(state.to_payload().unwrap(), Some(mock_payload()));
        assert_eq!(AlertConfigState::from_plan(None, None).to_payload().unwrap(), None);
    }

    #[test]
    fn test_round_trip_through_model() {
        let payload = AlertConfigPayload {
            receivers: vec![ReceiverPayload {
                name: "hooks".into(),
                email_configs: None,
                opsgenie_configs: Some(vec![OpsgenieConfigPayload {
                    api_key: Some("k".into()),
                    priority: Some("P1".into()),
                    ..Default::default()
                }]),
                web_hook_configs: Some(vec![WebHookConfigPayload {
                    url: Some("https://hooks.example".into()),
                    ms_teams: Some(true),
                    ..Default::default()
                }]),
            }],
            route: RoutePayload {
                receiver: Some("hooks".into()),
                group_wait: Some("10s".into()),
                routes: Some(vec![RoutePayload {
                    receiver: Some("hooks".into()),
                    match_re: Some(BTreeMap::from([("service".to_string(), "api|web".to_string())])),
                    ..Default::default()
                }]),
                ..Default::default()
            },
            global: Some(GlobalPayload {
                resolve_timeout: Some("5m".into()),
                ..Default::default()
            }),
        };
        let model = model_from_payload(&payload).unwrap();
        assert_eq!(to_payload(&model).unwrap(), payload);
    }

    #[test]
    fn test_schema_rejects_conflicting_webhook_flags() {
        let schema = crate::schema::Schema::v0().with_attribute("alert_config", schema_attribute());
        let config = json!({"alert_config": {
            "receivers": [{"name": "r", "webhooks_configs": [
                {"url": "https://x", "ms_teams": true, "google_chat": true}
            ]}],
            "route": {"receiver": "r"}
        }});
        let diagnostics = crate::validation::validate(&schema, &config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute.as_deref(),
            Some("alert_config.receivers.0.webhooks_configs.0.google_chat")
        );
    }
}
