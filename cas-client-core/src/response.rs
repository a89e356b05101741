use crate::CasError;

use std::collections::BTreeMap;

/// Outcome of a `serviceValidate` / `proxyValidate` call.
#[derive(Clone, Debug, PartialEq)]
pub enum ServiceResponse {
    Success {
        user: String,
        attributes: BTreeMap<String, String>,
        proxy_granting_ticket_iou: Option<String>,
    },
    Failure {
        code: String,
        message: String,
    },
}

/// Parses a CAS 2.0/3.0 validation response.
///
/// Attributes may sit under `<cas:attributes>` (CAS 3) or directly under
/// `<cas:authenticationSuccess>`. Multi-valued attributes are joined with `", "`.
pub fn parse_service_response(xml: &str) -> Result<ServiceResponse, CasError> {
    let document = roxmltree::Document::parse(xml)?;

    let mut user = String::new();
    let mut attributes: BTreeMap<String, String> = BTreeMap::new();
    let mut proxy_granting_ticket_iou = None;

    for node in document.root().descendants().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "authenticationFailure" => {
                let code = node.attribute("code").unwrap_or("UNKNOWN").to_string();
                let message = node.text().map(str::trim).unwrap_or_default().to_string();
                info!("CAS authentication failure: {}", code);
                return Ok(ServiceResponse::Failure { code, message });
            }
            "user" => {
                if let Some(text) = node.text() {
                    user.push_str(text.trim());
                }
            }
            "proxyGrantingTicket" => {
                proxy_granting_ticket_iou = node.text().map(|t| t.trim().to_string());
            }
            "serviceResponse" | "authenticationSuccess" | "attributes" | "proxies" | "proxy" => {}
            attr => {
                let parent = node.parent_element().map(|p| p.tag_name().name());
                if !matches!(parent, Some("attributes") | Some("authenticationSuccess")) {
                    continue;
                }
                if let Some(text) = node.text().map(str::trim) {
                    attributes
                        .entry(attr.to_string())
                        .and_modify(|existing| {
                            existing.push_str(", ");
                            existing.push_str(text);
                        })
                        .or_insert_with(|| text.to_string());
                }
            }
        }
    }

    if user.is_empty() {
        return Err(CasError::UnexpectedResponse(
            "response carries neither a user nor a failure".to_string(),
        ));
    }
    info!("CAS authentication success for {}", user);
    Ok(ServiceResponse::Success {
        user,
        attributes,
        proxy_granting_ticket_iou,
    })
}

/// Parses a `/proxy` response, returning the proxy ticket if one was granted.
pub fn parse_proxy_response(xml: &str) -> Result<Option<String>, CasError> {
    let document = roxmltree::Document::parse(xml)?;
    for node in document.root().descendants().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "proxyTicket" => return Ok(node.text().map(|t| t.trim().to_string())),
            "proxyFailure" => {
                warn!(
                    "CAS proxy failure: {}",
                    node.attribute("code").unwrap_or("UNKNOWN")
                );
                return Ok(None);
            }
            _ => {}
        }
    }
    Err(CasError::UnexpectedResponse(
        "proxy response carries neither a ticket nor a failure".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_failure() {
        let resp = "
        <cas:serviceResponse xmlns:cas=\"http://www.yale.edu/tp/cas\">
        <cas:authenticationFailure code=\"INVALID_TICKET\">
            Ticket ST-1856339-aA5Yuvrxzpv8Tau1cYQ7 not recognized
            </cas:authenticationFailure>
        </cas:serviceResponse>";
        assert_eq!(
            parse_service_response(resp).unwrap(),
            ServiceResponse::Failure {
                code: "INVALID_TICKET".to_string(),
                message: "Ticket ST-1856339-aA5Yuvrxzpv8Tau1cYQ7 not recognized".to_string(),
            }
        );
    }

    #[test]
    fn should_parse_success_without_attributes() {
        let resp = "
        <cas:serviceResponse xmlns:cas=\"http://www.yale.edu/tp/cas\">
        <cas:authenticationSuccess>
            <cas:user>username</cas:user>
        </cas:authenticationSuccess>
        </cas:serviceResponse>";
        assert_eq!(
            parse_service_response(resp).unwrap(),
            ServiceResponse::Success {
                user: "username".to_string(),
                attributes: BTreeMap::new(),
                proxy_granting_ticket_iou: None,
            }
        );
    }

    #[test]
    fn should_parse_attributes_and_pgt_iou() {
        let resp = "
        <cas:serviceResponse xmlns:cas=\"http://www.yale.edu/tp/cas\">
        <cas:authenticationSuccess>
            <cas:user>jdoe</cas:user>
            <cas:attributes>
                <cas:cn>John Doe</cas:cn>
                <cas:mail>john.doe@example.org</cas:mail>
                <cas:supannRoleEntite>staff</cas:supannRoleEntite>
                <cas:supannRoleEntite>faculty</cas:supannRoleEntite>
            </cas:attributes>
            <cas:proxyGrantingTicket>PGTIOU-84678-8a9d</cas:proxyGrantingTicket>
            <cas:proxies>
                <cas:proxy>https://proxy.example.org/</cas:proxy>
            </cas:proxies>
        </cas:authenticationSuccess>
        </cas:serviceResponse>";
        let mut attributes = BTreeMap::new();
        attributes.insert("cn".to_string(), "John Doe".to_string());
        attributes.insert("mail".to_string(), "john.doe@example.org".to_string());
        attributes.insert("supannRoleEntite".to_string(), "staff, faculty".to_string());
        assert_eq!(
            parse_service_response(resp).unwrap(),
            ServiceResponse::Success {
                user: "jdoe".to_string(),
                attributes,
                proxy_granting_ticket_iou: Some("PGTIOU-84678-8a9d".to_string()),
            }
        );
    }

    #[test]
    fn should_reject_malformed_xml() {
        assert!(matches!(
            parse_service_response("<cas:serviceResponse"),
            Err(CasError::Xml(_))
        ));
    }

    #[test]
    fn should_reject_empty_success() {
        let resp = "<serviceResponse><authenticationSuccess></authenticationSuccess></serviceResponse>";
        assert!(matches!(
            parse_service_response(resp),
            Err(CasError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn should_parse_proxy_ticket() {
        let resp = "
        <cas:serviceResponse xmlns:cas=\"http://www.yale.edu/tp/cas\">
            <cas:proxySuccess>
                <cas:proxyTicket>PT-1856392-b98xZrQN4p90ASrw96c8</cas:proxyTicket>
            </cas:proxySuccess>
        </cas:serviceResponse>";
        assert_eq!(
            parse_proxy_response(resp).unwrap(),
            Some("PT-1856392-b98xZrQN4p90ASrw96c8".to_string())
        );
    }

    #[test]
    fn should_parse_proxy_failure() {
        let resp = "
        <cas:serviceResponse xmlns:cas=\"http://www.yale.edu/tp/cas\">
            <cas:proxyFailure code=\"INVALID_REQUEST\">
                'pgt' and 'targetService' parameters are both required
            </cas:proxyFailure>
        </cas:serviceResponse>";
        assert_eq!(parse_proxy_response(resp).unwrap(), None);
    }
}
