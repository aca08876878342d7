pub(crate) mod chat_controller;
