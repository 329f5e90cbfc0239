use async_trait::async_trait;

use wallet_link_core::TimerPort;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[cfg(not(target_arch = "wasm32"))]
#[async_trait(?Send)]
impl TimerPort for TokioTimer {
    async fn sleep(&self, duration_ms: u64) {
        tokio::time::sleep(std::time::Duration::from_millis(duration_ms)).await;
    }
}

/// `setTimeout` wrapped in a promise.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserTimer;

#[cfg(target_arch = "wasm32")]
#[async_trait(?Send)]
impl TimerPort for BrowserTimer {
    async fn sleep(&self, duration_ms: u64) {
        let timeout = i32::try_from(duration_ms).unwrap_or(i32::MAX);
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window().map(|window| {
                window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout)
            });
            if !matches!(scheduled, Some(Ok(_))) {
                let _ = resolve.call0(&wasm_bindgen::JsValue::UNDEFINED);
            }
        });
        let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
    }
}
