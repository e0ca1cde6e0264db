mod write_back;
