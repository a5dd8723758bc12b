use tower_sessions::Session;

use crate::error::HeroshotError;

const FLASH_FLAG_KEY: &str = "flash_flag";

pub(crate) const FLASH_KEY_SAVED: u16 = 1;
pub(crate) const FLASH_KEY_FORGOTTEN: u16 = 2;
pub(crate) const FLASH_MISSING_KEY: u16 = 3;
pub(crate) const FLASH_GENERATION_FAILED: u16 = 4;
pub(crate) const FLASH_BUSY: u16 = 5;
pub(crate) const FLASH_POLISH_FAILED: u16 = 6;
pub(crate) const FLASH_EXPORT_FAILED: u16 = 7;
pub(crate) const FLASH_STYLE_INCOMPLETE: u16 = 8;
pub(crate) const FLASH_UPLOAD_REJECTED: u16 = 9;

#[derive(Clone, Debug)]
pub(crate) struct FlashMessage {
    pub(crate) text: &'static str,
    pub(crate) class: &'static str,
}

pub(crate) async fn set_flash(session: &Session, flag: u16) -> Result<(), HeroshotError> {
    session.insert(FLASH_FLAG_KEY, flag).await?;
    Ok(())
}

pub(crate) async fn take_flash_message(
    session: &Session,
) -> Result<Option<FlashMessage>, HeroshotError> {
    let flag = session
        .get::<u16>(FLASH_FLAG_KEY)
        .await?
        .filter(|flag| *flag != 0);
    if flag.is_some() {
        session.insert(FLASH_FLAG_KEY, 0u16).await?;
    }
    Ok(flag.and_then(message_for))
}

/// `(has_flash, text, class)` for templates.
pub(crate) fn template_fields(flash: Option<FlashMessage>) -> (bool, String, String) {
    match flash {
        Some(message) => (true, message.text.to_string(), message.class.to_string()),
        None => (false, String::new(), String::new()),
    }
}

fn message_for(flag: u16) -> Option<FlashMessage> {
    match flag {
        FLASH_KEY_SAVED => Some(FlashMessage {
            text: "API Key 已保存，仅保留在本次会话的内存中。",
            class: "success",
        }),
        FLASH_KEY_FORGOTTEN => Some(FlashMessage {
            text: "API Key 已清除。",
            class: "success",
        }),
        FLASH_MISSING_KEY => Some(FlashMessage {
            text: "请先配置 API Key。",
            class: "warning",
        }),
        FLASH_GENERATION_FAILED => Some(FlashMessage {
            text: "生成失败，请检查 API Key 或网络。",
            class: "error",
        }),
        FLASH_BUSY => Some(FlashMessage {
            text: "上一个请求仍在进行中，请稍候。",
            class: "warning",
        }),
        FLASH_POLISH_FAILED => Some(FlashMessage {
            text: "标题润色失败，已保留原标题。",
            class: "error",
        }),
        FLASH_EXPORT_FAILED => Some(FlashMessage {
            text: "下载失败，请先生成图片后重试。",
            class: "error",
        }),
        FLASH_STYLE_INCOMPLETE => Some(FlashMessage {
            text: "请同时填写风格名称和提示词。",
            class: "warning",
        }),
        FLASH_UPLOAD_REJECTED => Some(FlashMessage {
            text: "无法识别的图片文件。",
            class: "error",
        }),
        _ => None,
    }
}
