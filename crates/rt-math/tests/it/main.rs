mod int;
