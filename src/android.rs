//! JNI bindings for Android.
//!
//! These functions are called from Kotlin via the JNI bridge.

use jni::objects::{JClass, JString};
use jni::sys::jstring;
use jni::JNIEnv;

use crate::compute_layout_json;

/// Compute the layout of a compiled score and return canonical layout JSON.
///
/// Called from Kotlin as:
///   external fun computeLayout(scoreJson: String, configJson: String?): String?
#[no_mangle]
pub extern "system" fn Java_com_scorelayout_app_ScoreLayout_computeLayout(
    mut env: JNIEnv,
    _class: JClass,
    score_json: JString,
    config_json: JString,
) -> jstring {
    let score: String = match env.get_string(&score_json) {
        Ok(s) => s.into(),
        Err(e) => {
            log::error!("computeLayout: cannot read scoreJson: {e}");
            return std::ptr::null_mut();
        }
    };

    let config: Option<String> = if config_json.is_null() {
        None
    } else {
        match env.get_string(&config_json) {
            Ok(s) => Some(s.into()),
            Err(e) => {
                log::error!("computeLayout: cannot read configJson: {e}");
                return std::ptr::null_mut();
            }
        }
    };

    match compute_layout_json(&score, config.as_deref()) {
        Ok(json) => match env.new_string(&json) {
            Ok(js) => js.into_raw(),
            Err(e) => {
                log::error!("computeLayout: cannot create result string: {e}");
                std::ptr::null_mut()
            }
        },
        Err(e) => {
            log::error!("computeLayout: {e}");
            std::ptr::null_mut()
        }
    }
}
