use tauri::menu::{Menu, MenuItemBuilder, PredefinedMenuItem, Submenu};
use tauri::{Emitter, Manager};

/// Payload of the `zoom` event for a View menu item.
fn zoom_direction(id: &str) -> Option<&'static str> {
    match id {
        "zoom_in" => Some("in"),
        "zoom_out" => Some("out"),
        "zoom_reset" => Some("reset"),
        _ => None,
    }
}

pub(crate) fn build_menu<R: tauri::Runtime>(
    handle: &tauri::AppHandle<R>,
) -> tauri::Result<Menu<R>> {
    let app_name = handle.package_info().name.clone();

    let new_memo_item = MenuItemBuilder::with_id("file_new_memo", "New Memo")
        .accelerator("CmdOrCtrl+N")
        .build(handle)?;
    let import_item =
        MenuItemBuilder::with_id("file_import_memos", "Import...").build(handle)?;
    let save_item = MenuItemBuilder::with_id("file_save_memo", "Save")
        .accelerator("CmdOrCtrl+S")
        .build(handle)?;
    let file_menu = Submenu::with_items(
        handle,
        "File",
        true,
        &[
            &new_memo_item,
            &import_item,
            &PredefinedMenuItem::separator(handle)?,
            &save_item,
            &PredefinedMenuItem::separator(handle)?,
            &PredefinedMenuItem::close_window(handle, None)?,
            #[cfg(not(target_os = "macos"))]
            &PredefinedMenuItem::quit(handle, None)?,
        ],
    )?;

    let edit_menu = Submenu::with_items(
        handle,
        "Edit",
        true,
        &[
            &PredefinedMenuItem::undo(handle, None)?,
            &PredefinedMenuItem::redo(handle, None)?,
            &PredefinedMenuItem::separator(handle)?,
            &PredefinedMenuItem::cut(handle, None)?,
            &PredefinedMenuItem::copy(handle, None)?,
            &PredefinedMenuItem::paste(handle, None)?,
            &PredefinedMenuItem::select_all(handle, None)?,
        ],
    )?;

    let zoom_in_item = MenuItemBuilder::with_id("zoom_in", "Zoom In")
        .accelerator("CmdOrCtrl+=")
        .build(handle)?;
    let zoom_out_item = MenuItemBuilder::with_id("zoom_out", "Zoom Out")
        .accelerator("CmdOrCtrl+-")
        .build(handle)?;
    let zoom_reset_item = MenuItemBuilder::with_id("zoom_reset", "Actual Size")
        .accelerator("CmdOrCtrl+0")
        .build(handle)?;
    let view_menu = Submenu::with_items(
        handle,
        "View",
        true,
        &[&zoom_in_item, &zoom_out_item, &zoom_reset_item],
    )?;

    #[cfg(target_os = "macos")]
    {
        let app_menu = Submenu::with_items(
            handle,
            app_name,
            true,
            &[
                &PredefinedMenuItem::about(handle, None, None)?,
                &PredefinedMenuItem::separator(handle)?,
                &PredefinedMenuItem::hide(handle, None)?,
                &PredefinedMenuItem::hide_others(handle, None)?,
                &PredefinedMenuItem::separator(handle)?,
                &PredefinedMenuItem::quit(handle, None)?,
            ],
        )?;
        Menu::with_items(handle, &[&app_menu, &file_menu, &edit_menu, &view_menu])
    }

    #[cfg(not(target_os = "macos"))]
    {
        let _ = app_name;
        Menu::with_items(handle, &[&file_menu, &edit_menu, &view_menu])
    }
}

pub(crate) fn handle_menu_event<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    event: tauri::menu::MenuEvent,
) {
    let id = event.id().as_ref();
    if let Some(direction) = zoom_direction(id) {
        emit_to_main(app, "zoom", direction);
        return;
    }
    match id {
        "file_new_memo" => emit_to_main(app, "menu-new-memo", ()),
        "file_import_memos" => emit_to_main(app, "menu-import-memos", ()),
        "file_save_memo" => emit_to_main(app, "menu-save-memo", ()),
        _ => {}
    }
}

fn emit_to_main<R: tauri::Runtime, P: serde::Serialize + Clone>(
    app: &tauri::AppHandle<R>,
    event: &str,
    payload: P,
) {
    if let Some(window) = app.get_webview_window("main") {
        let _ = window.emit(event, payload);
    } else {
        let _ = app.emit(event, payload);
    }
}
