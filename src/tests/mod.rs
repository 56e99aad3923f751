mod helper;
mod invalid_json;
mod links;
mod root;
