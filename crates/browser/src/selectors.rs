//! Admin console selectors
//!
//! Every DOM hook the harness touches, in one place. These track a
//! third-party console and break whenever it redeploys; keeping them here
//! means a selector churn is a one-file change.

/// Selector set for the admin console under test.
#[derive(Debug, Clone)]
pub struct ConsoleSelectors {
    // Login form
    pub cookie_accept: String,
    pub email_field: String,
    pub password_field: String,
    pub submit_button: String,
    pub dashboard_indicator: String,
    pub login_error_message: String,

    // Nodes view
    pub nodes_button: String,
    pub node_row_subtitle: String,
    pub node_menu_button: String,
    pub node_delete_button: String,
    pub confirm_delete_button: String,
    pub empty_nodes_indicator: String,

    // Node creation wizard
    pub create_node_button: String,
    pub platform_select: String,
    pub network_select: String,
    pub wizard_submit_button: String,
    pub site1_endpoint_input: String,
    pub site2_endpoint_input: String,

    // API key panel
    pub reveal_api_key_button: String,
    pub api_key_input: String,
}

impl Default for ConsoleSelectors {
    fn default() -> Self {
        Self {
            cookie_accept: "#cookiescript_accept".into(),
            email_field: "#admin-login-email".into(),
            password_field: "#admin-login-password".into(),
            submit_button: r#"button[type="submit"]"#.into(),
            dashboard_indicator: r#"span[data-testid="test-typography"]"#.into(),
            login_error_message: "p._message_1mjxr_522".into(),

            nodes_button: r#"button[title="Nodes"]"#.into(),
            node_row_subtitle: "p._subtitle_1xepc_444".into(),
            node_menu_button: r#"button[aria-controls="control-string"]"#.into(),
            node_delete_button:
                r#"xpath=//*[@id="string"]/div/div/div/div/div/div[1]/button[2]"#.into(),
            confirm_delete_button: r#"button[data-testid="mui-button-destructive"]"#.into(),
            empty_nodes_indicator: r#"span[data-testid="test-typography"]"#.into(),

            create_node_button:
                r#"xpath=//*[@id="main_top"]/main/div/div[1]/div[2]/button"#.into(),
            platform_select: "select#select-protoccol".into(),
            network_select: "select#select-network".into(),
            wizard_submit_button:
                r#"footer.mui-modal-footer button[data-testid="mui-button-primary"]"#.into(),
            site1_endpoint_input: "xpath=/html/body/div[1]/div[5]/div/div/main/main/div/div[2]/section/div/div/div/div/div/div[2]/div[1]/div/div/input".into(),
            site2_endpoint_input: "xpath=/html/body/div[1]/div[5]/div/div/main/main/div/div[2]/section/div/div/div/div/div/div[2]/div[3]/div/div/input".into(),

            // The reveal control is the second generic button on the panel.
            reveal_api_key_button: r#"button[data-testid="mui-button"] >> nth=1"#.into(),
            api_key_input: r#"input[type="text"]"#.into(),
        }
    }
}
