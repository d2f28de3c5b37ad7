// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the cloud client using wiremock.

#![cfg(feature = "http")]

use std::sync::Arc;
use std::time::Duration;

use hearth_sync::config::{CloudConfig, DeviceConfig};
use hearth_sync::event::{AccessoryEvent, EventBus};
use hearth_sync::state::{Characteristic, CharacteristicValue};
use hearth_sync::transport::{CloudClient, DeviceCommand, RemoteTransport, Transports};
use hearth_sync::types::Brightness;
use hearth_sync::{Accessory, Capabilities, Error, ProtocolError};
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> CloudClient {
    CloudClient::new(&CloudConfig::new("t0k3n").with_base_url(server.uri())).unwrap()
}

// ============================================================================
// CloudClient Tests
// ============================================================================

mod cloud_client {
    use super::*;

    #[tokio::test]
    async fn status_request_is_authorized() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1.1/devices/C0FFEE000001/status"))
            .and(header("Authorization", "t0k3n"))
            .and(header_exists("t"))
            .and(header_exists("nonce"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "statusCode": 100,
                "message": "success",
                "body": { "power": "on", "brightness": 80 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server).status("C0FFEE000001").await.unwrap();
        assert!(response.is_success());
        assert_eq!(response.body["brightness"], 80);
    }

    #[tokio::test]
    async fn command_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1.1/devices/C0FFEE000001/commands"))
            .and(body_json(serde_json::json!({
                "command": "setBrightness",
                "parameter": "30",
                "commandType": "command"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "statusCode": 100,
                "message": "success",
                "body": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let command = DeviceCommand::SetBrightness(Brightness::new(30).unwrap());
        let response = client(&server)
            .command("C0FFEE000001", &command)
            .await
            .unwrap();
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn envelope_failure_maps_to_bad_status_code() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "statusCode": 161,
                "message": "device offline",
                "body": {}
            })))
            .mount(&server)
            .await;

        let response = client(&server).status("C0FFEE000001").await.unwrap();
        assert!(matches!(
            response.into_result(),
            Err(Error::BadStatusCode { status_code: 161, message }) if message == "device offline"
        ));
    }

    #[tokio::test]
    async fn http_error_maps_to_connection_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = client(&server).status("C0FFEE000001").await;
        assert!(matches!(
            result,
            Err(ProtocolError::ConnectionFailed(message)) if message.starts_with("HTTP 401")
        ));
    }

    #[tokio::test]
    async fn device_id_is_path_encoded() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1.1/devices/C0FFEE%2001/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "statusCode": 100,
                "body": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client(&server).status("C0FFEE 01").await.is_ok());
    }
}

// ============================================================================
// Accessory over CloudClient
// ============================================================================

mod accessory {
    use super::*;

    #[tokio::test]
    async fn refresh_and_write_through_cloud() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1.1/devices/C0FFEE000001/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "statusCode": 100,
                "body": { "power": "off", "brightness": 60 }
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1.1/devices/C0FFEE000001/commands"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "statusCode": 100,
                "body": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let bus = EventBus::new();
        let mut events = bus.subscribe();
        let config = DeviceConfig::remote("C0FFEE000001")
            .with_capabilities(Capabilities::dimmable_light())
            .with_refresh_rate(Duration::from_secs(3600))
            .with_push_rate(Duration::from_millis(20));
        let transports = Transports::new().with_remote(Arc::new(client(&server)));
        let lamp = Accessory::new(config, transports, Arc::new(bus.clone()));

        lamp.refresh().await;
        let event = events.recv().await.unwrap();
        assert_eq!(event.accessory_id(), lamp.id());
        assert!(matches!(
            event,
            AccessoryEvent::CharacteristicsUpdated { ref updates, .. }
                if updates.iter().any(|u| u.characteristic == Characteristic::Brightness
                    && u.value == CharacteristicValue::Int(60))
        ));

        lamp.set_power(true);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(lamp.published_state().power().is_on());
    }
}
