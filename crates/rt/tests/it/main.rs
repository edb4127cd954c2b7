mod translated_module;
