use crate::app::AppHandle;

pub struct AppState {
    pub app: AppHandle,
}
