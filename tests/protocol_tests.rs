//! 协议级测试
//!
//! 用本地 TCP 监听器扮演 vCloud 端点，验证登录会话、任务轮询与
//! 名称解析在真实 HTTP 往返下的行为。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use synaptic_vcloud::*;

/// 组装一个 200 响应，`extra_headers` 中每行以 `\r\n` 结尾
fn xml_response(extra_headers: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/vnd.vmware.vcloud.session+xml\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
        body.len(),
        extra_headers,
        body
    )
}

fn not_found() -> String {
    "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
}

fn session_body() -> String {
    r#"<Session><Link rel="down" type="application/vnd.vmware.vcloud.org+xml" href="/org/1"/></Session>"#
        .to_string()
}

fn session_response() -> String {
    xml_response("x-vcloud-authorization: token-1\r\n", &session_body())
}

/// 启动本地端点，按请求方法和路径返回预置响应，返回其基础 URL
async fn spawn_endpoint<F>(handler: F) -> String
where
    F: Fn(&str, &str) -> String + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        head.extend_from_slice(&buf[..n]);
                        if head.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                }
            }
            let request_line = String::from_utf8_lossy(&head).to_string();
            let mut parts = request_line.split_whitespace();
            let method = parts.next().unwrap_or("").to_string();
            let path = parts.next().unwrap_or("").to_string();
            let _ = socket.write_all(handler(&method, &path).as_bytes()).await;
        }
    });

    base_url
}

async fn logged_in_client(base_url: &str) -> VcloudClient {
    let mut client = VcloudClient::new(base_url, VcloudConfig::default()).unwrap();
    client.login("user@org", "secret").await.unwrap();
    client
}

#[tokio::test]
async fn test_never_terminal_task_raises_timeout() {
    // 任务一直停在 running：到达超时上限必须返回 Timeout，不得静默退出
    let base_url = spawn_endpoint(|method, path| match (method, path) {
        ("POST", "/sessions") => session_response(),
        ("GET", "/task/1") => xml_response("", r#"<Task href="/task/1" status="running"/>"#),
        _ => not_found(),
    })
    .await;

    let client = logged_in_client(&base_url).await;
    let result = client.task().wait_for_completion("/task/1", 0).await;

    assert!(matches!(result, Err(VcloudError::Timeout(_))));
}

#[tokio::test]
async fn test_find_by_name_prefers_first_listed_entity() {
    // 名称重复时取数据中心实体列表顺序中的第一个
    let base_url = spawn_endpoint(|method, path| match (method, path) {
        ("POST", "/sessions") => session_response(),
        ("GET", "/org/1") => xml_response(
            "",
            r#"<Org><Link rel="down" type="application/vnd.vmware.vcloud.vdc+xml" name="vdc1" href="/vdc/1"/></Org>"#,
        ),
        ("GET", "/vdc/1") => xml_response(
            "",
            r#"<Vdc name="vdc1" href="/vdc/1">
                <ResourceEntities>
                    <ResourceEntity type="application/vnd.vmware.vcloud.vApp+xml" name="box1" href="/vapp/1"/>
                    <ResourceEntity type="application/vnd.vmware.vcloud.vApp+xml" name="box1" href="/vapp/2"/>
                </ResourceEntities>
            </Vdc>"#,
        ),
        ("GET", "/vapp/1") => xml_response("", r#"<VApp name="box1" href="/vapp/1" status="8"/>"#),
        ("GET", "/vapp/2") => xml_response("", r#"<VApp name="box1" href="/vapp/2" status="4"/>"#),
        _ => not_found(),
    })
    .await;

    let client = logged_in_client(&base_url).await;
    let vapp = client.vapp().find_by_name("box1").await.unwrap();

    assert_eq!(vapp.href, "/vapp/1");
    assert_eq!(vapp.status, VAppStatus::PoweredOff);
}

#[tokio::test]
async fn test_resolve_source_fetches_template_once() {
    // 组合来源解析只允许查询模板一次
    let template_hits = Arc::new(AtomicUsize::new(0));
    let hits = Arc::clone(&template_hits);
    let base_url = spawn_endpoint(move |method, path| match (method, path) {
        ("POST", "/sessions") => session_response(),
        ("GET", "/template/1") => {
            hits.fetch_add(1, Ordering::SeqCst);
            xml_response(
                "",
                r#"<VAppTemplate name="ubuntu-template" href="/template/1"><Children><Vm href="/vm/123" name="vm-1"/></Children></VAppTemplate>"#,
            )
        }
        _ => not_found(),
    })
    .await;

    let client = logged_in_client(&base_url).await;
    let (template, vm_href) = client.template().resolve_source("/template/1").await.unwrap();

    assert_eq!(template.name, "ubuntu-template");
    assert_eq!(vm_href, "/vm/123");
    assert_eq!(template_hits.load(Ordering::SeqCst), 1);
}
