// SPDX-License-Identifier: Apache-2.0

use graft_core::ERROR_CODES;
use serde_json::{json, Value};

#[must_use]
pub fn openapi_v1_spec() -> Value {
    let error_codes: Vec<&str> = ERROR_CODES.iter().map(|c| c.as_str()).collect();
    let error_response = |description: &str| {
        json!({
            "description": description,
            "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ApiError"}}}
        })
    };
    json!({
      "openapi": "3.0.3",
      "info": {
        "title": "graft API",
        "version": "v1"
      },
      "paths": {
        "/healthz": {
          "get": {"responses": {"200": {"description": "ok"}}}
        },
        "/v1/openapi.json": {
          "get": {"responses": {"200": {"description": "this document"}}}
        },
        "/v1/schema": {
          "get": {"responses": {"200": {"description": "declared types and dispatchable field coordinates"}}}
        },
        "/v1/graph": {
          "post": {
            "requestBody": {
              "required": true,
              "content": {"application/json": {"schema": {"$ref": "#/components/schemas/GraphRequest"}}}
            },
            "responses": {
              "200": {"description": "field result wrapped in {data}"},
              "400": error_response("invalid identifier, cursor or arguments"),
              "403": error_response("denied by the authorization gate"),
              "404": error_response("node not found"),
              "422": error_response("mutation input rejected"),
              "500": error_response("internal error")
            }
          }
        }
      },
      "components": {
        "schemas": {
          "ErrorCode": {"type": "string", "enum": error_codes},
          "ApiError": {
            "type": "object",
            "required": ["code", "message", "details"],
            "additionalProperties": false,
            "properties": {
              "code": {"$ref": "#/components/schemas/ErrorCode"},
              "message": {"type": "string"},
              "details": {"type": "object"}
            }
          },
          "GraphRequest": {
            "type": "object",
            "required": ["field"],
            "additionalProperties": false,
            "properties": {
              "field": {"type": "string", "description": "Type.field coordinate"},
              "args": {"type": "object"},
              "actor": {"type": "string"}
            }
          },
          "PageInfo": {
            "type": "object",
            "required": ["hasNextPage", "hasPreviousPage", "startCursor", "endCursor"],
            "properties": {
              "hasNextPage": {"type": "boolean"},
              "hasPreviousPage": {"type": "boolean"},
              "startCursor": {"type": "string", "nullable": true},
              "endCursor": {"type": "string", "nullable": true}
            }
          }
        }
      }
    })
}
